//! Shared test harness for operator directory integration tests.
//!
//! Provides [`Authority`], a [`RecordLog`] served over real HTTP by an
//! [`RpcServer`] on an ephemeral port, and [`TestPki`], a root CA with
//! helpers for issuing operators and signing records.

use std::sync::Arc;
use std::time::Duration;

use opdir_log::RecordLog;
use opdir_remote::{JsonRpcSource, RemoteDirectory};
use opdir_rpc::RpcServer;
use opdir_store::{Datastore, MemoryDatastore};
use opdir_types::{ChangeRecord, RecordHash, SignedChangeRecord};
use opdir_verify::{ADMIN_GROUP, SigningIdentity, TrustStore};
use serde_json::json;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Far enough in the future for every test certificate.
pub const NOT_AFTER: u64 = 4_000_000_000_000;

// =========================================================================
// PKI
// =========================================================================

/// A root CA and the trust store anchored on it.
pub struct TestPki {
    pub ca: SigningIdentity,
    pub trust: TrustStore,
}

impl TestPki {
    pub fn new() -> Self {
        let ca = SigningIdentity::self_signed_ca("root", Vec::<String>::new(), 0, NOT_AFTER)
            .expect("generate root CA");
        let trust = TrustStore::with_root(ca.certificate().clone());
        Self { ca, trust }
    }

    /// Issue an `sd-admin` operator certificate for `name`.
    pub fn admin(&self, name: &str) -> SigningIdentity {
        self.ca
            .issue(name, [ADMIN_GROUP], false, 0, NOT_AFTER)
            .expect("issue admin")
    }

    /// Issue a certificate for `name` without any groups.
    pub fn member(&self, name: &str) -> SigningIdentity {
        self.ca
            .issue(name, Vec::<String>::new(), false, 0, NOT_AFTER)
            .expect("issue member")
    }
}

impl Default for TestPki {
    fn default() -> Self {
        Self::new()
    }
}

/// Sign a record in the signer's own entry.
pub fn signed(
    id: &SigningIdentity,
    parent: Option<RecordHash>,
    section: &str,
    value: &str,
    created_at: u64,
) -> SignedChangeRecord {
    let name = id.certificate().subject.clone();
    id.sign_record(
        parent,
        ChangeRecord::at(name, section, json!(value), created_at),
    )
    .expect("sign record")
}

/// A linear chain of `endpoint` records rooted at `root_time`.
pub fn chain(id: &SigningIdentity, root_time: u64, n: usize) -> Vec<SignedChangeRecord> {
    let mut out: Vec<SignedChangeRecord> = Vec::new();
    for i in 0..n {
        let parent = out.last().map(|r| r.hash);
        out.push(signed(id, parent, "endpoint", &format!("{root_time}-{i}"), root_time + i as u64));
    }
    out
}

// =========================================================================
// Authority
// =========================================================================

/// An authoritative log served on `127.0.0.1` until dropped.
pub struct Authority {
    log: Arc<RecordLog>,
    endpoint: String,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Authority {
    /// Serve a fresh in-memory log.
    pub async fn start(trust: TrustStore) -> Self {
        Self::start_with(Arc::new(MemoryDatastore::new()), trust).await
    }

    /// Serve a log over an existing datastore.
    pub async fn start_with(datastore: Arc<dyn Datastore>, trust: TrustStore) -> Self {
        let log = Arc::new(RecordLog::open(datastore, trust).expect("open log"));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind listener");
        let addr = listener.local_addr().expect("local addr");
        let (tx, rx) = oneshot::channel::<()>();

        let server = RpcServer::new(log.clone());
        let handle = tokio::spawn(async move {
            let shutdown = async {
                let _ = rx.await;
            };
            if let Err(e) = server.serve_with_shutdown(listener, shutdown).await {
                tracing::warn!(error = %e, "test server failed");
            }
        });

        Self {
            log,
            endpoint: format!("http://{addr}/jsonrpc"),
            shutdown: Some(tx),
            handle: Some(handle),
        }
    }

    pub fn log(&self) -> &Arc<RecordLog> {
        &self.log
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// A JSON-RPC client for this authority.
    pub fn client(&self) -> JsonRpcSource {
        JsonRpcSource::with_timeout(self.endpoint.clone(), Duration::from_secs(5))
            .expect("build client")
    }

    /// A follower with no cache window, so every query refetches.
    pub fn follower(&self, trust: TrustStore) -> RemoteDirectory {
        RemoteDirectory::new(Arc::new(self.client()), trust, Duration::ZERO)
    }

    /// Stop serving and wait for the server task to finish.
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for Authority {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}
