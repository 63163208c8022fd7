//! In-memory connector and session for tests

use crate::config::InitConfig;
use crate::session::{Connect, Session};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

/// Everything the fake database saw, shared between connector and sessions.
#[derive(Debug, Default)]
pub struct CallLog {
    pub connects: u32,
    pub executed: Vec<String>,
    pub commits: u32,
    pub rollbacks: u32,
    pub closes: u32,
    /// Tables that exist after committed work
    pub tables: BTreeSet<String>,
}

/// What the next connection attempt does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    Refused,
    /// Never completes; only the per-attempt timeout ends it.
    Hang,
    Unhealthy,
    /// Connects, then never answers the health check.
    Stall,
    Accept,
}

#[derive(Debug, Clone, Default)]
pub struct Behaviour {
    /// Statements the database rejects
    pub reject: HashSet<String>,
    /// Statements that panic the driver
    pub panic_on: HashSet<String>,
    pub fail_commit: bool,
    pub fail_rollback: bool,
    pub fail_close: bool,
}

pub struct FakeConnector {
    plan: Mutex<VecDeque<Attempt>>,
    fallback: Attempt,
    behaviour: Behaviour,
    log: Arc<Mutex<CallLog>>,
}

impl FakeConnector {
    /// Connector that accepts every attempt.
    pub fn accepting() -> Self {
        Self::with_plan(Vec::new(), Attempt::Accept)
    }

    /// Connector that refuses every attempt.
    pub fn refusing() -> Self {
        Self::with_plan(Vec::new(), Attempt::Refused)
    }

    /// Play `plan` in order, then repeat `fallback` forever.
    pub fn with_plan(plan: Vec<Attempt>, fallback: Attempt) -> Self {
        Self {
            plan: Mutex::new(plan.into()),
            fallback,
            behaviour: Behaviour::default(),
            log: Arc::new(Mutex::new(CallLog::default())),
        }
    }

    pub fn rejecting(mut self, statement: &str) -> Self {
        self.behaviour.reject.insert(statement.to_string());
        self
    }

    pub fn panicking_on(mut self, statement: &str) -> Self {
        self.behaviour.panic_on.insert(statement.to_string());
        self
    }

    pub fn failing_commit(mut self) -> Self {
        self.behaviour.fail_commit = true;
        self
    }

    pub fn failing_rollback(mut self) -> Self {
        self.behaviour.fail_rollback = true;
        self
    }

    pub fn failing_close(mut self) -> Self {
        self.behaviour.fail_close = true;
        self
    }

    pub fn log(&self) -> Arc<Mutex<CallLog>> {
        Arc::clone(&self.log)
    }

    /// A session on this connector's database without going through connect.
    pub fn session(&self) -> FakeSession {
        FakeSession::new(Arc::clone(&self.log), self.behaviour.clone(), true)
    }
}

#[async_trait]
impl Connect for FakeConnector {
    type Session = FakeSession;

    async fn connect(&self, _config: &InitConfig) -> Result<FakeSession> {
        let attempt = self
            .plan
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.fallback);
        self.log.lock().unwrap().connects += 1;

        match attempt {
            Attempt::Refused => Err(anyhow!("Can't connect to MySQL server (111)")),
            Attempt::Hang => std::future::pending().await,
            Attempt::Unhealthy => Ok(FakeSession::new(
                Arc::clone(&self.log),
                self.behaviour.clone(),
                false,
            )),
            Attempt::Stall => {
                let mut session =
                    FakeSession::new(Arc::clone(&self.log), self.behaviour.clone(), true);
                session.stalled = true;
                Ok(session)
            }
            Attempt::Accept => Ok(FakeSession::new(
                Arc::clone(&self.log),
                self.behaviour.clone(),
                true,
            )),
        }
    }
}

/// Session over the shared [`CallLog`].
///
/// `CREATE TABLE` work is staged and only becomes visible in
/// `CallLog::tables` on commit.
pub struct FakeSession {
    log: Arc<Mutex<CallLog>>,
    behaviour: Behaviour,
    healthy: bool,
    stalled: bool,
    pending: BTreeSet<String>,
}

impl FakeSession {
    fn new(log: Arc<Mutex<CallLog>>, behaviour: Behaviour, healthy: bool) -> Self {
        Self {
            log,
            behaviour,
            healthy,
            stalled: false,
            pending: BTreeSet::new(),
        }
    }

    pub fn disconnected(mut self) -> Self {
        self.healthy = false;
        self
    }

    fn table_exists(&self, name: &str) -> bool {
        self.pending.contains(name) || self.log.lock().unwrap().tables.contains(name)
    }
}

/// Table name from `CREATE TABLE [IF NOT EXISTS] name(...)`.
fn created_table(statement: &str) -> Option<(String, bool)> {
    let upper = statement.to_ascii_uppercase();
    let (rest, if_not_exists) = if upper.starts_with("CREATE TABLE IF NOT EXISTS ") {
        (&statement["CREATE TABLE IF NOT EXISTS ".len()..], true)
    } else if upper.starts_with("CREATE TABLE ") {
        (&statement["CREATE TABLE ".len()..], false)
    } else {
        return None;
    };
    let name: String = rest
        .trim_start()
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    Some((name, if_not_exists))
}

#[async_trait]
impl Session for FakeSession {
    async fn execute(&mut self, statement: &str) -> Result<()> {
        if self.behaviour.panic_on.contains(statement) {
            panic!("driver crashed on {statement}");
        }
        if self.behaviour.reject.contains(statement) {
            return Err(anyhow!("You have an error in your SQL syntax near '{statement}'"));
        }
        if let Some((table, if_not_exists)) = created_table(statement) {
            if self.table_exists(&table) {
                if !if_not_exists {
                    return Err(anyhow!("Table '{table}' already exists"));
                }
            } else {
                self.pending.insert(table);
            }
        }
        self.log.lock().unwrap().executed.push(statement.to_string());
        Ok(())
    }

    async fn is_healthy(&mut self) -> bool {
        if self.stalled {
            std::future::pending::<()>().await;
        }
        self.healthy
    }

    async fn commit(&mut self) -> Result<()> {
        if self.behaviour.fail_commit {
            return Err(anyhow!("Lost connection to MySQL server during query"));
        }
        let mut log = self.log.lock().unwrap();
        log.commits += 1;
        log.tables.append(&mut self.pending);
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        self.pending.clear();
        self.log.lock().unwrap().rollbacks += 1;
        if self.behaviour.fail_rollback {
            return Err(anyhow!("Lost connection to MySQL server during query"));
        }
        Ok(())
    }

    async fn close(self) -> Result<()> {
        self.log.lock().unwrap().closes += 1;
        if self.behaviour.fail_close {
            return Err(anyhow!("Broken pipe (os error 32)"));
        }
        Ok(())
    }
}
