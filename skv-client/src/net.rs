//! # RESP2 Network Backend
//!
//! Purpose: Reach the backing store over TCP using RESP2 commands.
//!
//! ## Design Principles
//! 1. **One Session, One Connection**: Queries on a session are serialized
//!    over a single TCP stream guarded by an async mutex.
//! 2. **Seeds In Order**: Each connect attempt walks the seed list and keeps
//!    the first store that answers the `PING` handshake.
//! 3. **Discard On Failure**: A stream that failed or timed out mid-reply is
//!    dropped, never reused; the next query dials the same store again.
//! 4. **Fixed Deadlines**: Connects and queries run under the timeouts taken
//!    from `ConnectTarget`.
//!
//! ## Command Mapping
//!
//! ```text
//! handshake  PING             -> +PONG
//! get        GET k            -> $len value | $-1 (not found)
//! upsert     SET k v EX secs  -> +OK
//! delete     DEL k            -> :0 | :1
//! ```

use std::io;
use std::time::Duration;

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time;
use tracing::debug;

use skv_common::StoreError;

use crate::backend::{ConnectTarget, Connector, Session};
use crate::config::DEFAULT_SEED;
use crate::resp::{encode_command, parse_frame, RespValue};

/// Connector speaking RESP2 over TCP.
#[derive(Debug, Clone, Copy, Default)]
pub struct RespConnector;

impl Connector for RespConnector {
    type Session = RespSession;

    async fn connect(&self, target: &ConnectTarget) -> Result<RespSession, StoreError> {
        let fallback = [DEFAULT_SEED.to_string()];
        let seeds: &[String] = if target.seeds.is_empty() {
            &fallback
        } else {
            &target.seeds
        };

        let mut last_err = None;
        for seed in seeds {
            match Connection::open(seed, target.connect_timeout).await {
                Ok(mut conn) => match handshake(&mut conn, target.query_timeout).await {
                    Ok(()) => {
                        debug!(seed = %seed, "store handshake complete");
                        return Ok(RespSession::new(seed.clone(), conn, target));
                    }
                    Err(err) => {
                        debug!(seed = %seed, error = %err, "store handshake failed");
                        last_err = Some(err);
                    }
                },
                Err(err) => {
                    debug!(seed = %seed, error = %err, "store seed unreachable");
                    last_err = Some(err);
                }
            }
        }

        Err(last_err.unwrap_or(StoreError::NoSeeds))
    }
}

async fn handshake(conn: &mut Connection, timeout: Duration) -> Result<(), StoreError> {
    match with_deadline(timeout, conn.exec(&[b"PING"])).await? {
        RespValue::Simple(_) | RespValue::Bulk(Some(_)) => Ok(()),
        RespValue::Error(message) => Err(server_error(message)),
        _ => Err(StoreError::UnexpectedResponse),
    }
}

/// Session bound to the store address that accepted the handshake.
#[derive(Debug)]
pub struct RespSession {
    addr: String,
    connect_timeout: Duration,
    query_timeout: Duration,
    conn: Mutex<Option<Connection>>,
}

impl RespSession {
    fn new(addr: String, conn: Connection, target: &ConnectTarget) -> Self {
        RespSession {
            addr,
            connect_timeout: target.connect_timeout,
            query_timeout: target.query_timeout,
            conn: Mutex::new(Some(conn)),
        }
    }

    /// Address of the store this session talks to.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    async fn query(&self, args: &[&[u8]]) -> Result<RespValue, StoreError> {
        let mut slot = self.conn.lock().await;
        // Taking the stream out means a cancelled or failed query drops it.
        let mut conn = match slot.take() {
            Some(conn) => conn,
            None => {
                debug!(addr = %self.addr, "redialing store after failed query");
                Connection::open(&self.addr, self.connect_timeout).await?
            }
        };

        let reply = with_deadline(self.query_timeout, conn.exec(args)).await;
        if reply.is_ok() {
            *slot = Some(conn);
        }
        reply
    }
}

impl Session for RespSession {
    async fn get(&self, key: &str) -> Result<String, StoreError> {
        match self.query(&[b"GET", key.as_bytes()]).await? {
            RespValue::Bulk(Some(data)) => {
                String::from_utf8(data).map_err(|_| StoreError::Protocol)
            }
            RespValue::Bulk(None) => Err(StoreError::NotFound),
            RespValue::Error(message) => Err(server_error(message)),
            _ => Err(StoreError::UnexpectedResponse),
        }
    }

    async fn upsert(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let seconds = ttl.as_secs().to_string();
        match self
            .query(&[b"SET", key.as_bytes(), value.as_bytes(), b"EX", seconds.as_bytes()])
            .await?
        {
            RespValue::Simple(_) => Ok(()),
            RespValue::Error(message) => Err(server_error(message)),
            _ => Err(StoreError::UnexpectedResponse),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        match self.query(&[b"DEL", key.as_bytes()]).await? {
            RespValue::Integer(_) => Ok(()),
            RespValue::Error(message) => Err(server_error(message)),
            _ => Err(StoreError::UnexpectedResponse),
        }
    }
}

/// Single TCP stream with reusable buffers.
#[derive(Debug)]
struct Connection {
    stream: TcpStream,
    read_buf: BytesMut,
    write_buf: Vec<u8>,
}

impl Connection {
    async fn open(addr: &str, timeout: Duration) -> Result<Self, StoreError> {
        let stream = time::timeout(timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| StoreError::Timeout(timeout))??;
        // Small request/reply pairs; Nagle only adds latency.
        stream.set_nodelay(true)?;

        Ok(Connection {
            stream,
            read_buf: BytesMut::with_capacity(4 * 1024),
            write_buf: Vec::with_capacity(256),
        })
    }

    async fn exec(&mut self, args: &[&[u8]]) -> Result<RespValue, StoreError> {
        self.write_buf.clear();
        encode_command(args, &mut self.write_buf);
        self.stream.write_all(&self.write_buf).await?;
        self.stream.flush().await?;

        loop {
            if let Some((value, used)) = parse_frame(&self.read_buf)? {
                self.read_buf.advance(used);
                return Ok(value);
            }
            if self.stream.read_buf(&mut self.read_buf).await? == 0 {
                return Err(StoreError::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "store closed the connection",
                )));
            }
        }
    }
}

async fn with_deadline<F>(timeout: Duration, fut: F) -> Result<RespValue, StoreError>
where
    F: std::future::Future<Output = Result<RespValue, StoreError>>,
{
    time::timeout(timeout, fut)
        .await
        .unwrap_or(Err(StoreError::Timeout(timeout)))
}

fn server_error(message: Vec<u8>) -> StoreError {
    StoreError::Server {
        message: String::from_utf8_lossy(&message).into_owned(),
    }
}
