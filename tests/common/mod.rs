//! In-process HTTP fixture server and catalog page builders for crawl tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

struct Route {
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
    fail_first: usize,
    hits: usize,
}

/// Minimal HTTP/1.1 server serving canned responses by exact path.
pub struct FixtureServer {
    addr: SocketAddr,
    routes: Arc<Mutex<HashMap<String, Route>>>,
    accept_task: JoinHandle<()>,
}

impl FixtureServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let routes: Arc<Mutex<HashMap<String, Route>>> = Arc::new(Mutex::new(HashMap::new()));

        let accept_routes = routes.clone();
        let accept_task = tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    return;
                };
                let routes = accept_routes.clone();
                tokio::spawn(handle_connection(stream, routes));
            }
        });

        Self {
            addr,
            routes,
            accept_task,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Register an HTML page at `path`.
    pub fn page(&self, path: &str, html: impl Into<String>) {
        self.insert(path, 200, "text/html", html.into().into_bytes());
    }

    /// Register a binary body at `path`.
    pub fn bytes(&self, path: &str, content_type: &'static str, body: &[u8]) {
        self.insert(path, 200, content_type, body.to_vec());
    }

    /// Register a path answering with a bare status code.
    pub fn status(&self, path: &str, status: u16) {
        self.insert(path, status, "text/plain", Vec::new());
    }

    /// Make the next `n` requests to `path` answer 500 before the real body.
    pub fn fail_first(&self, path: &str, n: usize) {
        let mut routes = self.routes.lock().unwrap();
        if let Some(route) = routes.get_mut(path) {
            route.fail_first = n;
        }
    }

    /// How many requests `path` has received, including failures.
    pub fn hits(&self, path: &str) -> usize {
        self.routes
            .lock()
            .unwrap()
            .get(path)
            .map_or(0, |route| route.hits)
    }

    fn insert(&self, path: &str, status: u16, content_type: &'static str, body: Vec<u8>) {
        self.routes.lock().unwrap().insert(
            path.to_string(),
            Route {
                status,
                content_type,
                body,
                fail_first: 0,
                hits: 0,
            },
        );
    }
}

impl Drop for FixtureServer {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}

async fn handle_connection(mut stream: TcpStream, routes: Arc<Mutex<HashMap<String, Route>>>) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        match stream.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            Err(_) => return,
        }
    }

    let request = String::from_utf8_lossy(&buf);
    let path = request.split_whitespace().nth(1).unwrap_or("/").to_string();

    let (status, content_type, body) = {
        let mut routes = routes.lock().unwrap();
        match routes.get_mut(&path) {
            Some(route) => {
                route.hits += 1;
                if route.fail_first > 0 {
                    route.fail_first -= 1;
                    (500, "text/plain", Vec::new())
                } else {
                    (route.status, route.content_type, route.body.clone())
                }
            }
            None => (404, "text/plain", Vec::new()),
        }
    };

    let reason = match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Unknown",
    };
    let header = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    let _ = stream.write_all(header.as_bytes()).await;
    let _ = stream.write_all(&body).await;
    let _ = stream.shutdown().await;
}

/// Root page with the side navigation listing `categories` as
/// `(name, href)` pairs.
pub fn root_page(categories: &[(&str, &str)]) -> String {
    let items: String = categories
        .iter()
        .map(|(name, href)| format!(r#"<li><a href="{href}">{name}</a></li>"#))
        .collect();
    format!(
        r#"<html><body><div class="side_categories">
        <ul class="nav nav-list"><li><a href="catalogue/category/books_1/index.html">Books</a>
        <ul>{items}</ul></li></ul>
        </div></body></html>"#
    )
}

/// Listing page with one `product_pod` per href.
pub fn listing_page(product_hrefs: &[&str]) -> String {
    let pods: String = product_hrefs
        .iter()
        .map(|href| {
            format!(r#"<article class="product_pod"><h3><a href="{href}">a book</a></h3></article>"#)
        })
        .collect();
    format!("<html><body><section>{pods}</section></body></html>")
}

/// A complete, parseable product detail page.
pub fn product_page(title: &str, upc: &str, category: &str, image_src: &str) -> String {
    format!(
        r#"<html><body>
        <ul class="breadcrumb">
          <li><a href="/">Home</a></li>
          <li><a href="/books">Books</a></li>
          <li><a href="/cat">{category}</a></li>
          <li class="active">{title}</li>
        </ul>
        <div id="product_gallery"><img src="{image_src}"/></div>
        <h1>{title}</h1>
        <p class="star-rating Four"></p>
        <table class="table table-striped">
          <tr><th>UPC</th><td>{upc}</td></tr>
          <tr><th>Price (excl. tax)</th><td>&pound;20.00</td></tr>
          <tr><th>Price (incl. tax)</th><td>&pound;22.00</td></tr>
          <tr><th>Availability</th><td>In stock (5 available)</td></tr>
        </table>
        <div id="product_description"><h2>Product Description</h2></div>
        <p>A description of {title}.</p>
        </body></html>"#
    )
}
