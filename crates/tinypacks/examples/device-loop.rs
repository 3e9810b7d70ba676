//! Simulated device answering requests over a loopback TCP link.
//!
//! The device side feeds received bytes one at a time into a `Framer`, the
//! way firmware would from a UART interrupt, and answers each frame through
//! a `Postman`. The host side uses the blocking `Client`.
//!
//! Run with:
//!   cargo run --example device-loop

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;

use tinypacks::framer::Framer;
use tinypacks::postman::{serve_frame, Client, Postman, Request, Resource, Status};

#[derive(Default)]
struct Led {
    on: bool,
}

impl Resource for Led {
    fn get(&mut self, request: &mut Request<'_>) -> Status {
        match request.writer.put_boolean(self.on) {
            Ok(()) => Status::Content,
            Err(_) => Status::RequestEntityTooLarge,
        }
    }

    fn put(&mut self, request: &mut Request<'_>) -> Status {
        if !request.reader.advance() || !request.reader.is_boolean() {
            return Status::BadRequest;
        }
        self.on = request.reader.get_boolean();
        Status::Changed
    }
}

fn run_device(mut stream: TcpStream) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut led = Led::default();
    let mut postman = Postman::new();
    postman.register("led", &mut led)?;

    let mut framer = Framer::new([0u8; 64]);
    let mut scratch = [0u8; 64];
    let mut byte = [0u8; 1];
    while stream.read(&mut byte)? == 1 {
        if framer.receive_byte(byte[0]).is_none() {
            continue;
        }
        serve_frame(&mut framer, &mut postman, &mut scratch)?;
        let mut out = Vec::new();
        while framer.is_sending() {
            out.push(framer.next_byte_to_send());
        }
        stream.write_all(&out)?;
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    let device = thread::spawn(move || -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let (stream, _) = listener.accept()?;
        run_device(stream)
    });

    let stream = TcpStream::connect(addr)?;
    let mut client = Client::new(stream.try_clone()?, stream, 64);

    let index = client.get("")?;
    let mut paths = index.body_decoder();
    if paths.advance() && paths.enter_list().is_ok() {
        while paths.advance() {
            eprintln!("resource: {}", paths.as_str().unwrap_or("?"));
        }
    }

    // PUT led true: a single Boolean element.
    let response = client.put("led", &[0x21, 0x01])?;
    eprintln!("PUT led -> {}", response.status);

    let response = client.get("led")?;
    let mut body = response.body_decoder();
    let on = body.advance() && body.get_boolean();
    eprintln!("GET led -> {} (on = {on})", response.status);

    let response = client.get("missing")?;
    eprintln!("GET missing -> {}", response.status);

    let (reader, writer) = client.into_inner();
    writer.shutdown(std::net::Shutdown::Both)?;
    drop(reader);
    device
        .join()
        .map_err(|_| "device thread panicked")?
        .map_err(|err| err.to_string())?;
    Ok(())
}
