//! An in-memory data server speaking a Redis-like wire protocol.
//!
//! Clients send arrays of bulk strings over TCP; the server interprets them
//! as commands against a shared keyed store and replies in the same wire
//! grammar. Supported functionality:
//!
//! - Basic key-value operations (GET, SET with expiry options, DEL, INCR)
//! - List operations (LPUSH, RPUSH, LPOP, BLPOP, LRANGE, LLEN)
//! - Stream operations (XADD, XRANGE, XREAD)
//! - Server commands (PING, ECHO, TYPE, INFO, COMMAND)
//! - Transactions (MULTI, EXEC, DISCARD)
//! - Blocking operations with client notifications and deadlines
//!
//! Connections run on separate tasks, but every store and coordinator access
//! is serialized behind a single mutex so each command executes atomically.

pub mod commands;
pub mod connection;
pub mod key_value_store;
pub mod resp;
pub mod server;
pub mod state;
