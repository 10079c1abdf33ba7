//! Shared server state outside the keyspace: the registry of blocked
//! clients and per-connection transaction queues.
//!
//! Waiters are kept per key in registration order. List waiters are woken
//! one at a time (FIFO), stream waiters are woken all at once so each can
//! re-evaluate its full wait-set. The coordinator never touches stored
//! data; woken commands re-run against the store themselves.

use std::collections::{HashMap, VecDeque};

use thiserror::Error;
use tokio::sync::mpsc;

use crate::commands::CommandHandler;

#[derive(Error, Debug, PartialEq)]
pub enum StateError {
    #[error("MULTI calls can not be nested")]
    NestedTransaction,
    #[error("no transaction started")]
    NoActiveTransaction,
}

/// A client suspended on a list key, waiting for a push.
#[derive(Debug, Clone)]
pub struct ListWaiter {
    pub client_address: String,
    pub sender: mpsc::Sender<bool>,
}

/// A client suspended on one key of an XREAD wait-set.
#[derive(Debug, Clone)]
pub struct StreamWaiter {
    pub client_address: String,
    pub sender: mpsc::Sender<bool>,
}

#[derive(Default)]
pub struct State {
    list_waiters: HashMap<String, VecDeque<ListWaiter>>,
    stream_waiters: HashMap<String, Vec<StreamWaiter>>,
    transactions: HashMap<String, Vec<CommandHandler>>,
}

impl State {
    pub fn new() -> Self {
        State {
            list_waiters: HashMap::new(),
            stream_waiters: HashMap::new(),
            transactions: HashMap::new(),
        }
    }

    pub fn add_list_waiter(&mut self, key: String, waiter: ListWaiter) {
        self.list_waiters.entry(key).or_default().push_back(waiter);
    }

    pub fn remove_list_waiter(&mut self, key: &str, client_address: &str) {
        if let Some(waiters) = self.list_waiters.get_mut(key) {
            waiters.retain(|waiter| waiter.client_address != client_address);
        }
    }

    /// Wakes the earliest-registered live waiter on `key`, consuming its
    /// registration. Waiters whose channel is gone (client disconnected)
    /// are discarded instead of absorbing the wakeup.
    pub fn notify_list_waiter(&mut self, key: &str) {
        let Some(waiters) = self.list_waiters.get_mut(key) else {
            return;
        };

        while let Some(waiter) = waiters.pop_front() {
            if waiter.sender.try_send(true).is_ok() {
                break;
            }
        }
    }

    pub fn add_stream_waiter(&mut self, key: String, waiter: StreamWaiter) {
        self.stream_waiters.entry(key).or_default().push(waiter);
    }

    pub fn remove_stream_waiter(&mut self, key: &str, client_address: &str) {
        if let Some(waiters) = self.stream_waiters.get_mut(key) {
            waiters.retain(|waiter| waiter.client_address != client_address);
        }
    }

    /// Wakes every waiter registered on `key`. Registrations stay in
    /// place; each woken client re-checks its own condition and removes
    /// itself when done.
    pub fn notify_stream_waiters(&mut self, key: &str) {
        let Some(waiters) = self.stream_waiters.get_mut(key) else {
            return;
        };

        waiters.retain(|waiter| !waiter.sender.is_closed());

        for waiter in waiters.iter() {
            // A full channel means a wakeup is already pending, which is
            // just as good as delivering another one.
            let _ = waiter.sender.try_send(true);
        }
    }

    pub fn start_transaction(&mut self, client_address: String) -> Result<(), StateError> {
        if self.transactions.contains_key(&client_address) {
            return Err(StateError::NestedTransaction);
        }

        self.transactions.insert(client_address, Vec::new());
        Ok(())
    }

    pub fn is_in_transaction(&self, client_address: &str) -> bool {
        self.transactions.contains_key(client_address)
    }

    pub fn add_to_transaction(
        &mut self,
        client_address: String,
        command: CommandHandler,
    ) -> Result<(), StateError> {
        match self.transactions.get_mut(&client_address) {
            Some(queued) => {
                queued.push(command);
                Ok(())
            }
            None => Err(StateError::NoActiveTransaction),
        }
    }

    /// Takes the queued commands for `client_address`, ending its
    /// transaction.
    pub fn remove_transaction(
        &mut self,
        client_address: &str,
    ) -> Result<Vec<CommandHandler>, StateError> {
        self.transactions
            .remove(client_address)
            .ok_or(StateError::NoActiveTransaction)
    }

    /// Purges everything a closing connection left behind: its
    /// transaction and its waiter registrations under every key. Leaving
    /// a multi-key waiter half-removed would corrupt the wait lists.
    pub fn clear_connection(&mut self, client_address: &str) {
        self.transactions.remove(client_address);

        for waiters in self.list_waiters.values_mut() {
            waiters.retain(|waiter| waiter.client_address != client_address);
        }

        for waiters in self.stream_waiters.values_mut() {
            waiters.retain(|waiter| waiter.client_address != client_address);
        }
    }
}
