#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use skv_client::ClientConfig;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn fast_config(seeds: Vec<String>) -> ClientConfig {
    ClientConfig {
        seeds,
        connect_timeout_ms: 1_000,
        query_timeout_ms: 300,
        retry_delay_ms: 50,
    }
}

/// Returns an address nothing listens on.
pub fn closed_addr() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    listener.local_addr().expect("addr").to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    /// Answers like a RESP store (TTL is recorded, not enforced).
    Normal,
    /// Answers every data command with `-ERR boom`.
    ErrorReplies,
    /// Answers PING, never answers data commands.
    Stall,
}

/// Thread-per-connection RESP2 store bound to a random local port.
pub struct FakeStore {
    pub addr: String,
    log: Arc<Mutex<Vec<Vec<String>>>>,
    connections: Arc<AtomicUsize>,
}

impl FakeStore {
    pub fn start(behavior: Behavior) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr").to_string();
        let log = Arc::new(Mutex::new(Vec::new()));
        let connections = Arc::new(AtomicUsize::new(0));
        let rows = Arc::new(Mutex::new(HashMap::new()));

        {
            let log = Arc::clone(&log);
            let connections = Arc::clone(&connections);
            thread::spawn(move || {
                for stream in listener.incoming() {
                    let Ok(stream) = stream else { break };
                    connections.fetch_add(1, Ordering::SeqCst);
                    let log = Arc::clone(&log);
                    let rows = Arc::clone(&rows);
                    thread::spawn(move || serve(stream, behavior, rows, log));
                }
            });
        }

        FakeStore {
            addr,
            log,
            connections,
        }
    }

    /// Every command received so far, across connections.
    pub fn commands(&self) -> Vec<Vec<String>> {
        self.log.lock().unwrap().clone()
    }

    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

fn serve(
    mut stream: TcpStream,
    behavior: Behavior,
    rows: Arc<Mutex<HashMap<Vec<u8>, Vec<u8>>>>,
    log: Arc<Mutex<Vec<Vec<String>>>>,
) {
    let mut reader = BufReader::new(stream.try_clone().expect("clone"));
    while let Ok(args) = read_command(&mut reader) {
        log.lock()
            .unwrap()
            .push(args.iter().map(|arg| String::from_utf8_lossy(arg).into_owned()).collect());

        let command = args[0].to_ascii_uppercase();
        if command == b"PING" {
            write_simple(&mut stream, "PONG");
            continue;
        }
        match behavior {
            Behavior::Stall => continue,
            Behavior::ErrorReplies => {
                write_error(&mut stream, "ERR boom");
                continue;
            }
            Behavior::Normal => {}
        }

        match command.as_slice() {
            b"GET" => match rows.lock().unwrap().get(&args[1]) {
                Some(value) => write_bulk(&mut stream, value),
                None => write_null(&mut stream),
            },
            b"SET" => {
                rows.lock().unwrap().insert(args[1].clone(), args[2].clone());
                write_simple(&mut stream, "OK");
            }
            b"DEL" => {
                let removed = rows.lock().unwrap().remove(&args[1]).is_some();
                write_integer(&mut stream, removed as i64);
            }
            _ => write_error(&mut stream, "ERR unknown command"),
        }
    }
}

fn read_command(reader: &mut BufReader<TcpStream>) -> std::io::Result<Vec<Vec<u8>>> {
    let mut line = Vec::new();
    read_line(reader, &mut line)?
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof"))?;
    if line.first() != Some(&b'*') {
        return Err(std::io::Error::new(std::io::ErrorKind::InvalidData, "expected array"));
    }
    let count = parse_usize(&line[1..])?;
    let mut args = Vec::with_capacity(count);
    for _ in 0..count {
        read_line(reader, &mut line)?
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof"))?;
        if line.first() != Some(&b'$') {
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidData, "expected bulk"));
        }
        let len = parse_usize(&line[1..])?;
        let mut data = vec![0u8; len];
        reader.read_exact(&mut data)?;
        let mut crlf = [0u8; 2];
        reader.read_exact(&mut crlf)?;
        if crlf != [b'\r', b'\n'] {
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidData, "missing crlf"));
        }
        args.push(data);
    }
    if args.is_empty() {
        return Err(std::io::Error::new(std::io::ErrorKind::InvalidData, "empty command"));
    }
    Ok(args)
}

fn read_line(reader: &mut BufReader<TcpStream>, buf: &mut Vec<u8>) -> std::io::Result<Option<()>> {
    buf.clear();
    let bytes = reader.read_until(b'\n', buf)?;
    if bytes == 0 {
        return Ok(None);
    }
    if buf.len() < 2 || buf[buf.len() - 2] != b'\r' {
        return Err(std::io::Error::new(std::io::ErrorKind::InvalidData, "invalid line"));
    }
    buf.truncate(buf.len() - 2);
    Ok(Some(()))
}

fn parse_usize(data: &[u8]) -> std::io::Result<usize> {
    std::str::from_utf8(data)
        .ok()
        .and_then(|text| text.parse().ok())
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidData, "length"))
}

fn write_simple(stream: &mut TcpStream, msg: &str) {
    let _ = stream.write_all(format!("+{msg}\r\n").as_bytes());
    let _ = stream.flush();
}

fn write_error(stream: &mut TcpStream, msg: &str) {
    let _ = stream.write_all(format!("-{msg}\r\n").as_bytes());
    let _ = stream.flush();
}

fn write_null(stream: &mut TcpStream) {
    let _ = stream.write_all(b"$-1\r\n");
    let _ = stream.flush();
}

fn write_bulk(stream: &mut TcpStream, data: &[u8]) {
    let _ = stream.write_all(format!("${}\r\n", data.len()).as_bytes());
    let _ = stream.write_all(data);
    let _ = stream.write_all(b"\r\n");
    let _ = stream.flush();
}

fn write_integer(stream: &mut TcpStream, value: i64) {
    let _ = stream.write_all(format!(":{value}\r\n").as_bytes());
    let _ = stream.flush();
}
