//! Subcommand implementations.
//!
//! Every command returns its result instead of printing it; `main` owns
//! stdout.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use opdir_log::RecordLog;
use opdir_remote::{Directory, JsonRpcSource, RemoteDirectory};
use opdir_rpc::RpcServer;
use opdir_types::{
    Certificate, ChangeRecord, DirectoryEntry, DirectoryQuery, SignedChangeRecord, now_millis,
};
use opdir_verify::{
    IdentityFile, SignedData, SigningIdentity, TrustStore, Verification, verify_signed_value,
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::config::{CliConfig, DirectoryMode};

const MILLIS_PER_DAY: u64 = 24 * 60 * 60 * 1000;

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
}

/// Build the trust store from the certificate files named in `[trust]`.
pub fn load_trust(config: &CliConfig) -> Result<TrustStore> {
    let load = |paths: &[std::path::PathBuf]| -> Result<Vec<Certificate>> {
        paths.iter().map(|p| read_json(p)).collect()
    };
    let trust = TrustStore::new(load(&config.trust.roots)?, load(&config.trust.intermediates)?);
    if trust.roots.is_empty() {
        warn!("no trust roots configured; every signed record will be rejected");
    }
    Ok(trust)
}

/// Load the `[signing]` identity.
pub fn load_identity(config: &CliConfig) -> Result<SigningIdentity> {
    let path = config
        .signing
        .identity
        .as_deref()
        .context("no signing identity configured ([signing] identity)")?;
    let file: IdentityFile = read_json(path)?;
    SigningIdentity::from_file(file)
        .with_context(|| format!("invalid identity file {}", path.display()))
}

/// Open the authoritative log over the configured datastore.
pub fn open_log(config: &CliConfig) -> Result<Arc<RecordLog>> {
    let datastore = config.storage.open().context("failed to open datastore")?;
    let log = RecordLog::open(datastore, load_trust(config)?).context("failed to load record log")?;
    Ok(Arc::new(log))
}

/// The directory named by `[directory]`: the local log, or a follower of a
/// remote authority.
pub fn build_directory(config: &CliConfig) -> Result<Arc<dyn Directory>> {
    match config.directory.mode {
        DirectoryMode::Local => Ok(open_log(config)?),
        DirectoryMode::Remote => {
            if config.directory.endpoint.is_empty() {
                bail!("remote directory mode requires [directory] endpoint");
            }
            let source = JsonRpcSource::new(config.directory.endpoint.clone())?;
            info!(endpoint = %config.directory.endpoint, "following remote directory");
            Ok(Arc::new(RemoteDirectory::new(
                Arc::new(source),
                load_trust(config)?,
                config.directory.cache_for(),
            )))
        }
    }
}

/// Serve the local log over JSON-RPC until ctrl-c.
pub async fn serve(config: &CliConfig) -> Result<()> {
    if config.directory.mode != DirectoryMode::Local {
        bail!("serve requires a local directory");
    }
    let log = open_log(config)?;
    info!(
        addr = %config.node.listen_addr,
        backend = config.storage.name(),
        records = log.chain().len(),
        "starting opdird"
    );

    if config.node.update_interval > 0 {
        let log = log.clone();
        let period = Duration::from_secs(config.node.update_interval);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await;
            loop {
                interval.tick().await;
                let log = log.clone();
                match tokio::task::spawn_blocking(move || log.update()).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => warn!(error = %e, "periodic log update failed"),
                    Err(e) => warn!(error = %e, "periodic log update panicked"),
                }
            }
        });
    }

    let listener = tokio::net::TcpListener::bind(&config.node.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.node.listen_addr))?;
    RpcServer::new(log)
        .serve_with_shutdown(listener, async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await
        .context("JSON-RPC server failed")
}

/// Entries of every operator, or only of `name`.
pub async fn get_entries(directory: &dyn Directory, name: Option<&str>) -> Result<Vec<DirectoryEntry>> {
    let query = match name {
        Some(n) => DirectoryQuery::operator(n),
        None => DirectoryQuery::all(),
    };
    Ok(directory.entries(&query).await?)
}

/// A change to submit; the creation time is assigned at signing.
#[derive(Debug, Deserialize)]
struct RecordInput {
    name: String,
    section: String,
    data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct SubmitFile {
    records: Vec<RecordInput>,
}

/// Sign the records in `path` and submit them.
///
/// Records are chained onto the current tip, or start a new root chain
/// when `reset` is set.
pub async fn submit_records(
    directory: &dyn Directory,
    identity: &SigningIdentity,
    trust: &TrustStore,
    path: &Path,
    reset: bool,
) -> Result<Vec<SignedChangeRecord>> {
    let input: SubmitFile = read_json(path)?;
    if input.records.is_empty() {
        bail!("{} contains no records", path.display());
    }

    let now = now_millis();
    if !trust.verify_chain(identity.certificate(), now)? {
        bail!(
            "certificate of {} does not chain to a trusted root",
            identity.certificate().subject
        );
    }

    let mut parent = if reset {
        None
    } else {
        directory.tip().await?.map(|tip| tip.hash)
    };
    let mut signed = Vec::with_capacity(input.records.len());
    for r in input.records {
        let record = identity.sign_record(parent, ChangeRecord::at(r.name, r.section, r.data, now))?;
        parent = Some(record.hash);
        signed.push(record);
    }

    directory
        .submit(signed.clone())
        .await
        .context("directory refused the records")?;
    info!(count = signed.len(), reset, "records submitted");
    Ok(signed)
}

/// Sign the JSON document in `path`. The result is checked against the
/// configured trust store before it is returned.
pub fn sign(identity: &SigningIdentity, trust: &TrustStore, path: &Path) -> Result<SignedData> {
    let data: serde_json::Value = read_json(path)?;
    let signed = identity.sign_value(data)?;
    let subject = &identity.certificate().subject;
    if let Verification::Rejected(reason) = verify_signed_value(&signed, trust, subject, now_millis())? {
        bail!("produced signature does not verify: {reason}");
    }
    Ok(signed)
}

/// Verify a document produced by `sign` as coming from `name`.
pub fn verify(trust: &TrustStore, path: &Path, name: &str) -> Result<()> {
    let signed: SignedData = read_json(path)?;
    match verify_signed_value(&signed, trust, name, now_millis())? {
        Verification::Valid => Ok(()),
        Verification::Rejected(reason) => bail!("signature rejected: {reason}"),
    }
}

/// Options for generating a new identity.
#[derive(Debug)]
pub struct KeygenOptions<'a> {
    pub subject: &'a str,
    pub groups: &'a [String],
    pub ca: bool,
    pub days: u64,
    /// Issuer identity file; a self-signed root is generated when absent.
    pub issuer: Option<&'a Path>,
}

/// Generate a key and certificate.
pub fn keygen(opts: &KeygenOptions<'_>) -> Result<IdentityFile> {
    let not_before = now_millis();
    let not_after = not_before.saturating_add(opts.days.saturating_mul(MILLIS_PER_DAY));
    let identity = match opts.issuer {
        None => {
            if !opts.ca {
                warn!(subject = opts.subject, "self-signed identities are always CAs");
            }
            SigningIdentity::self_signed_ca(opts.subject, opts.groups.iter().cloned(), not_before, not_after)?
        }
        Some(path) => {
            let issuer = SigningIdentity::from_file(read_json(path)?)
                .with_context(|| format!("invalid issuer identity {}", path.display()))?;
            if !issuer.certificate().is_ca {
                bail!("issuer {} is not a CA", issuer.certificate().subject);
            }
            issuer.issue(opts.subject, opts.groups.iter().cloned(), opts.ca, not_before, not_after)?
        }
    };
    info!(
        subject = opts.subject,
        fingerprint = %identity.certificate().fingerprint()?,
        "generated identity"
    );
    Ok(identity.to_file())
}
