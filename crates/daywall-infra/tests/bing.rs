use std::io::{BufRead, BufReader, Cursor, Write};
use std::net::TcpListener;
use std::thread;

use daywall_core::ports::{ImageDownloader, MetadataFeed};
use daywall_core::FetchError;
use daywall_infra::bing::BingClient;

struct Reply {
    status: &'static str,
    content_type: &'static str,
    body: Vec<u8>,
}

/// Serve one reply per connection, in order. Returns the base URL and the request lines seen.
fn serve(replies: Vec<Reply>) -> (String, thread::JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());

    let handle = thread::spawn(move || {
        let mut seen = Vec::new();
        for reply in replies {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();
            seen.push(request_line.trim().to_string());
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
                    break;
                }
            }

            let mut stream = stream;
            write!(
                stream,
                "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                reply.status,
                reply.content_type,
                reply.body.len()
            )
            .unwrap();
            stream.write_all(&reply.body).unwrap();
            stream.flush().unwrap();
        }
        seen
    });

    (base, handle)
}

fn png() -> Vec<u8> {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::new(8, 8));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn feed_then_download() {
    let feed = br#"{"images":[{"startdate":"20240501","url":"/img/puffins.jpg","title":"Puffins","copyright":"Skomer (c) Someone"}]}"#;
    let (base, server) = serve(vec![
        Reply {
            status: "200 OK",
            content_type: "application/json",
            body: feed.to_vec(),
        },
        Reply {
            status: "200 OK",
            content_type: "image/png",
            body: png(),
        },
    ]);

    let client = BingClient::with_base_url(&base);
    let entry = client.fetch_metadata("de-DE").unwrap();
    assert_eq!(entry.source_url, format!("{base}/img/puffins.jpg"));
    assert_eq!(entry.description, "Skomer");

    let bytes = client.download(&entry.source_url).unwrap();
    assert_eq!(bytes, png());

    let seen = server.join().unwrap();
    assert_eq!(
        seen[0],
        "GET /HPImageArchive.aspx?format=js&idx=0&n=1&mkt=de-DE HTTP/1.1"
    );
    assert_eq!(seen[1], "GET /img/puffins.jpg HTTP/1.1");
}

#[test]
fn html_instead_of_image_is_rejected() {
    let (base, server) = serve(vec![Reply {
        status: "200 OK",
        content_type: "text/html",
        body: b"<html>login required</html>".to_vec(),
    }]);

    let err = BingClient::with_base_url(&base)
        .download(&format!("{base}/img.jpg"))
        .unwrap_err();
    assert!(matches!(err, FetchError::Validation(_)), "{err:?}");
    server.join().unwrap();
}

#[test]
fn http_error_is_network_error() {
    let (base, server) = serve(vec![Reply {
        status: "503 Service Unavailable",
        content_type: "text/plain",
        body: b"down".to_vec(),
    }]);

    let err = BingClient::with_base_url(&base)
        .fetch_metadata("en-US")
        .unwrap_err();
    match err {
        FetchError::Network(msg) => assert!(msg.contains("503"), "{msg}"),
        other => panic!("unexpected error: {other:?}"),
    }
    server.join().unwrap();
}
