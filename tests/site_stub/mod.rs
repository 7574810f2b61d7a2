use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// One canned response of the stub site.
#[derive(Debug, Clone)]
pub struct StubResponse {
    pub status: u16,
    pub content_type: Option<&'static str>,
    pub body: Vec<u8>,
    pub location: Option<String>,
}

#[allow(dead_code)]
impl StubResponse {
    pub fn html(body: &str) -> Self {
        Self {
            status: 200,
            content_type: Some("text/html; charset=utf-8"),
            body: body.as_bytes().to_vec(),
            location: None,
        }
    }

    /// UTF-8 bytes served under a Latin-1 label, like the real archive pages.
    pub fn html_mislabelled(body: &str) -> Self {
        Self {
            status: 200,
            content_type: Some("text/html; charset=ISO-8859-1"),
            body: body.as_bytes().to_vec(),
            location: None,
        }
    }

    pub fn pdf(body: Vec<u8>) -> Self {
        Self { status: 200, content_type: Some("application/pdf"), body, location: None }
    }

    pub fn redirect(to: &str) -> Self {
        Self { status: 302, content_type: None, body: Vec::new(), location: Some(to.to_owned()) }
    }
}

pub struct SiteStub {
    pub base_url: String,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl SiteStub {
    /// Serve a fixed route table; anything not routed is a 404.
    pub fn spawn(routes: HashMap<String, StubResponse>) -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start site stub server");
        let addr = server.server_addr();
        let base_url = format!("http://{addr}");

        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                let request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                let path = request.url().to_string();
                let Some(route) = routes.get(&path) else {
                    let _ = request.respond(
                        tiny_http::Response::from_string("not found").with_status_code(404),
                    );
                    continue;
                };

                let mut response = tiny_http::Response::from_data(route.body.clone())
                    .with_status_code(route.status);
                if let Some(content_type) = route.content_type {
                    let header = tiny_http::Header::from_bytes(
                        &b"Content-Type"[..],
                        content_type.as_bytes(),
                    )
                    .expect("build content-type header");
                    response = response.with_header(header);
                }
                if let Some(location) = &route.location {
                    let header =
                        tiny_http::Header::from_bytes(&b"Location"[..], location.as_bytes())
                            .expect("build location header");
                    response = response.with_header(header);
                }
                let _ = request.respond(response);
            }
        });

        Self { base_url, shutdown_tx: Some(shutdown_tx), handle: Some(handle) }
    }
}

impl Drop for SiteStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Minimal well-formed PDF, optionally carrying a creation date in its info
/// dictionary.
#[allow(dead_code)]
pub fn minimal_pdf(creation_date: Option<&str>) -> Vec<u8> {
    let mut objects = vec![
        "1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n".to_string(),
        "2 0 obj\n<< /Type /Pages /Kids [3 0 R] /Count 1 >>\nendobj\n".to_string(),
        "3 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] >>\nendobj\n".to_string(),
    ];
    if let Some(date) = creation_date {
        objects.push(format!("4 0 obj\n<< /CreationDate ({date}) >>\nendobj\n"));
    }

    let mut body = String::from("%PDF-1.4\n");
    let mut offsets = Vec::new();
    for object in &objects {
        offsets.push(body.len());
        body.push_str(object);
    }

    let xref_start = body.len();
    body.push_str(&format!("xref\n0 {}\n", objects.len() + 1));
    body.push_str("0000000000 65535 f \n");
    for offset in offsets {
        body.push_str(&format!("{offset:010} 00000 n \n"));
    }
    body.push_str(&format!("trailer\n<< /Size {} /Root 1 0 R", objects.len() + 1));
    if creation_date.is_some() {
        body.push_str(" /Info 4 0 R");
    }
    body.push_str(&format!(" >>\nstartxref\n{xref_start}\n%%EOF\n"));
    body.into_bytes()
}

/// Every regular file under `dir`, recursively.
#[allow(dead_code)]
pub fn files_under(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut stack = vec![dir.to_path_buf()];
    while let Some(current) = stack.pop() {
        for entry in std::fs::read_dir(current)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
                continue;
            }
            files.push(path);
        }
    }
    Ok(files)
}
