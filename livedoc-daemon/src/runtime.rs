use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::ErrorKind;
use std::os::unix::net::UnixStream as StdUnixStream;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use notify::{recommended_watcher, Event, EventKind, RecursiveMode, Watcher};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::OwnedWriteHalf;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc, oneshot, RwLock};
use tokio::time::Instant;

use livedoc_core::{config, Profile, TenantId};
use livedoc_sync::{open_store, publish_draft, LiveStore, SyncError};

use crate::debounce::{sleep_until, Debouncer};
use crate::error::{io_err, DaemonError};
use crate::paths::{logs_dir, resolve_draft, run_dir, socket_path, DEBOUNCE_WINDOW};
use crate::protocol::{DaemonRequest, DaemonResponse, CMD_PUBLISH, CMD_STATUS, CMD_STOP};

/// What the daemon remembers about each tenant it has published.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TenantRecord {
    /// Unix seconds of the last verified publish; 0 when none yet.
    pub last_publish_at_unix: u64,
    pub used_fallback: bool,
    pub checkpoint: Option<String>,
    pub nonce: Option<String>,
    pub last_error: Option<String>,
}

pub type TenantRecords = HashMap<TenantId, TenantRecord>;

/// A watch entry with its draft path resolved for matching notify events.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Watched {
    tenant: TenantId,
    draft: PathBuf,
}

#[derive(Debug, Clone)]
enum PublishTarget {
    All,
    Tenant(TenantId),
    Draft(PathBuf),
}

impl PublishTarget {
    fn matches(&self, watched: &Watched) -> bool {
        match self {
            PublishTarget::All => true,
            PublishTarget::Tenant(tenant) => &watched.tenant == tenant,
            PublishTarget::Draft(path) => &watched.draft == path,
        }
    }

    fn label(&self) -> String {
        match self {
            PublishTarget::All => "all".to_string(),
            PublishTarget::Tenant(tenant) => format!("tenant '{tenant}'"),
            PublishTarget::Draft(path) => path.display().to_string(),
        }
    }
}

struct PublishJob {
    target: PublishTarget,
    source: &'static str,
    respond_to: oneshot::Sender<Result<PublishSummary, String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublishedDraft {
    pub tenant: String,
    pub draft: String,
    pub nonce: String,
    pub used_fallback: bool,
    pub checkpoint: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedDraft {
    pub tenant: String,
    pub draft: String,
    pub error: String,
    /// The fallback ran and the data may not have been saved.
    pub terminal_fallback: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublishSummary {
    pub target: String,
    pub source: String,
    pub published: Vec<PublishedDraft>,
    pub failed: Vec<FailedDraft>,
    pub duration_ms: u128,
}

/// State shared by every daemon task.
#[derive(Clone)]
struct DaemonContext {
    home: PathBuf,
    profile: String,
    store: Arc<dyn LiveStore>,
    watched: Arc<Vec<Watched>>,
    records: Arc<RwLock<TenantRecords>>,
    started_at_unix: u64,
}

impl DaemonContext {
    fn new(home: PathBuf, profile: &Profile, store: Arc<dyn LiveStore>) -> Self {
        let watched = profile
            .watch
            .iter()
            .map(|entry| Watched {
                tenant: entry.tenant.clone(),
                draft: canonical_draft(&resolve_draft(&home, &entry.draft)),
            })
            .collect();
        Self {
            home,
            profile: profile.name.clone(),
            store,
            watched: Arc::new(watched),
            records: Arc::new(RwLock::new(TenantRecords::new())),
            started_at_unix: unix_seconds_now(),
        }
    }
}

/// Start the daemon for `profile_name` and block the current thread until it exits.
pub fn start_blocking(home: &Path, profile_name: &str) -> Result<(), DaemonError> {
    ensure_runtime_dirs(home)?;
    crate::logging::init_daemon_tracing(home);
    let profile = config::profile_at(home, profile_name)?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(run(home.to_path_buf(), profile))
}

/// Run the daemon: watcher, publish processor, socket server, log rotation.
pub async fn run(home: PathBuf, profile: Profile) -> Result<(), DaemonError> {
    ensure_runtime_dirs(&home)?;

    let store: Arc<dyn LiveStore> = Arc::from(open_store(&profile)?);
    let ctx = DaemonContext::new(home, &profile, store);
    if ctx.watched.is_empty() {
        tracing::warn!(profile = %ctx.profile, "profile has no watch entries; nothing to publish");
    }
    tracing::info!(
        profile = %ctx.profile,
        drafts = ctx.watched.len(),
        socket = %socket_path(&ctx.home).display(),
        "daemon starting",
    );

    let (publish_tx, publish_rx) = mpsc::channel::<PublishJob>(64);
    let (shutdown_tx, _) = broadcast::channel::<()>(16);

    let watcher_handle = {
        let shutdown = shutdown_tx.clone();
        let ctx = ctx.clone();
        let publish_tx = publish_tx.clone();
        tokio::spawn(async move {
            let result = watcher_task(ctx, publish_tx, shutdown.subscribe()).await;
            let _ = shutdown.send(());
            result
        })
    };

    let processor_handle = {
        let shutdown = shutdown_tx.clone();
        let ctx = ctx.clone();
        tokio::spawn(async move {
            let result = publish_processor_task(ctx, publish_rx, shutdown.subscribe()).await;
            let _ = shutdown.send(());
            result
        })
    };

    let socket_handle = {
        let shutdown = shutdown_tx.clone();
        let ctx = ctx.clone();
        tokio::spawn(async move {
            let result =
                socket_server_task(ctx, publish_tx, shutdown.clone(), shutdown.subscribe()).await;
            let _ = shutdown.send(());
            result
        })
    };

    let rotation_handle = {
        let shutdown = shutdown_tx.clone();
        let home = ctx.home.clone();
        tokio::spawn(async move {
            let result = log_rotation_task(home, shutdown.subscribe()).await;
            let _ = shutdown.send(());
            result
        })
    };

    let signal_handle = {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            let mut shutdown_rx = shutdown.subscribe();
            tokio::select! {
                _ = shutdown_rx.recv() => Ok(()),
                signal = tokio::signal::ctrl_c() => match signal {
                    Ok(()) => {
                        tracing::info!("received ctrl-c, shutting down daemon");
                        let _ = shutdown.send(());
                        Ok(())
                    }
                    Err(err) => Err(DaemonError::Protocol(format!("ctrl-c handler failed: {err}"))),
                }
            }
        })
    };

    let (watcher_result, processor_result, socket_result, rotation_result, signal_result) = tokio::join!(
        watcher_handle,
        processor_handle,
        socket_handle,
        rotation_handle,
        signal_handle
    );

    handle_join("watcher", watcher_result)?;
    handle_join("publish_processor", processor_result)?;
    handle_join("socket_server", socket_result)?;
    handle_join("log_rotation", rotation_result)?;
    handle_join("signal_handler", signal_result)?;
    tracing::info!("daemon stopped");
    Ok(())
}

// ---------------------------------------------------------------------------
// Watcher
// ---------------------------------------------------------------------------

async fn watcher_task(
    ctx: DaemonContext,
    publish_tx: mpsc::Sender<PublishJob>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<notify::Result<Event>>();
    let mut watcher = recommended_watcher(move |event| {
        let _ = event_tx.send(event);
    })?;

    let mut watched_dirs = HashSet::new();
    for entry in ctx.watched.iter() {
        let Some(dir) = entry.draft.parent() else {
            continue;
        };
        if !dir.is_dir() {
            tracing::warn!(dir = %dir.display(), "draft directory missing; not watching");
            continue;
        }
        if watched_dirs.insert(dir.to_path_buf()) {
            watcher.watch(dir, RecursiveMode::NonRecursive)?;
            tracing::debug!(dir = %dir.display(), "watching draft directory");
        }
    }

    let drafts: HashSet<PathBuf> = ctx.watched.iter().map(|w| w.draft.clone()).collect();
    let mut debounce = Debouncer::new(DEBOUNCE_WINDOW);

    loop {
        let next_deadline = debounce.next_deadline();
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            event = event_rx.recv() => {
                let Some(event) = event else { break };
                let event = match event {
                    Ok(event) => event,
                    Err(err) => {
                        tracing::warn!(error = %err, "watcher event error");
                        continue;
                    }
                };
                if !is_relevant_event_kind(&event.kind) {
                    continue;
                }
                for path in event.paths {
                    if drafts.contains(&path) {
                        debounce.touch(&path, Instant::now());
                    }
                }
            }
            _ = sleep_until(next_deadline) => {
                for draft in debounce.take_due(Instant::now()) {
                    match enqueue_publish(&publish_tx, PublishTarget::Draft(draft), "watcher").await {
                        Ok(summary) => tracing::info!(
                            target = %summary.target,
                            published = summary.published.len(),
                            failed = summary.failed.len(),
                            duration_ms = summary.duration_ms,
                            "watcher-triggered publish completed",
                        ),
                        Err(err) => tracing::error!(error = %err, "watcher-triggered publish failed"),
                    }
                }
            }
        }
    }

    drop(watcher);
    Ok(())
}

fn is_relevant_event_kind(kind: &EventKind) -> bool {
    matches!(kind, EventKind::Create(_) | EventKind::Modify(_))
}

/// Canonicalize the parent so event paths (which arrive canonical) compare
/// equal even before the draft itself exists.
fn canonical_draft(path: &Path) -> PathBuf {
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => fs::canonicalize(parent)
            .map(|dir| dir.join(name))
            .unwrap_or_else(|_| path.to_path_buf()),
        _ => path.to_path_buf(),
    }
}

// ---------------------------------------------------------------------------
// Publish processor
// ---------------------------------------------------------------------------

async fn publish_processor_task(
    ctx: DaemonContext,
    mut publish_rx: mpsc::Receiver<PublishJob>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            maybe_job = publish_rx.recv() => {
                let Some(job) = maybe_job else { break };
                let outcome = run_publish_job(&ctx, &job.target, job.source)
                    .await
                    .map_err(|err| err.to_string());
                let _ = job.respond_to.send(outcome);
            }
        }
    }
    Ok(())
}

/// Publish every watched draft matching `target`, one after another.
async fn run_publish_job(
    ctx: &DaemonContext,
    target: &PublishTarget,
    source: &'static str,
) -> Result<PublishSummary, DaemonError> {
    let started = Instant::now();
    let entries: Vec<Watched> = ctx
        .watched
        .iter()
        .filter(|w| target.matches(w))
        .cloned()
        .collect();
    if entries.is_empty() {
        return Err(DaemonError::Protocol(format!(
            "no watched draft for {}",
            target.label()
        )));
    }

    let mut published = Vec::new();
    let mut failed = Vec::new();
    for entry in entries {
        let store = ctx.store.clone();
        let (tenant, draft) = (entry.tenant.clone(), entry.draft.clone());
        let result = tokio::task::spawn_blocking(move || publish_draft(&*store, &tenant, &draft))
            .await
            .map_err(|err| DaemonError::Protocol(format!("publish task join error: {err}")))?;

        let mut records = ctx.records.write().await;
        let record = records.entry(entry.tenant.clone()).or_default();
        match result {
            Ok(outcome) => {
                let checkpoint = outcome.checkpoint.as_ref().map(ToString::to_string);
                record.last_publish_at_unix = unix_seconds_now();
                record.used_fallback = outcome.used_fallback;
                record.checkpoint = checkpoint.clone();
                record.nonce = Some(outcome.stamp.nonce.clone());
                record.last_error = None;
                tracing::info!(
                    tenant = %entry.tenant,
                    draft = %entry.draft.display(),
                    used_fallback = outcome.used_fallback,
                    source,
                    "published draft",
                );
                published.push(PublishedDraft {
                    tenant: entry.tenant.to_string(),
                    draft: entry.draft.display().to_string(),
                    nonce: outcome.stamp.nonce,
                    used_fallback: outcome.used_fallback,
                    checkpoint,
                });
            }
            Err(err) => {
                let terminal_fallback =
                    matches!(&err, SyncError::Publish(e) if e.is_terminal_fallback());
                if terminal_fallback {
                    tracing::error!(
                        tenant = %entry.tenant,
                        error = %err,
                        "publish not reflected after fallback; data may not have saved",
                    );
                } else {
                    tracing::warn!(tenant = %entry.tenant, error = %err, "publish failed");
                }
                record.last_error = Some(err.to_string());
                failed.push(FailedDraft {
                    tenant: entry.tenant.to_string(),
                    draft: entry.draft.display().to_string(),
                    error: err.to_string(),
                    terminal_fallback,
                });
            }
        }
    }

    Ok(PublishSummary {
        target: target.label(),
        source: source.to_string(),
        published,
        failed,
        duration_ms: started.elapsed().as_millis(),
    })
}

async fn enqueue_publish(
    publish_tx: &mpsc::Sender<PublishJob>,
    target: PublishTarget,
    source: &'static str,
) -> Result<PublishSummary, DaemonError> {
    let (tx, rx) = oneshot::channel();
    publish_tx
        .send(PublishJob {
            target,
            source,
            respond_to: tx,
        })
        .await
        .map_err(|_| DaemonError::ChannelClosed("publish queue"))?;

    rx.await
        .map_err(|_| DaemonError::ChannelClosed("publish response"))?
        .map_err(DaemonError::Protocol)
}

// ---------------------------------------------------------------------------
// Socket server
// ---------------------------------------------------------------------------

async fn socket_server_task(
    ctx: DaemonContext,
    publish_tx: mpsc::Sender<PublishJob>,
    shutdown_tx: broadcast::Sender<()>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    let socket = socket_path(&ctx.home);
    prepare_socket_for_bind(&socket)?;

    let listener = UnixListener::bind(&socket).map_err(|e| io_err(&socket, e))?;
    set_socket_permissions(&socket)?;

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            accepted = listener.accept() => {
                let (stream, _) = accepted.map_err(|e| io_err(&socket, e))?;
                let ctx = ctx.clone();
                let publish_tx = publish_tx.clone();
                let shutdown_tx = shutdown_tx.clone();
                tokio::spawn(async move {
                    if let Err(err) = handle_socket_client(stream, ctx, publish_tx, shutdown_tx).await {
                        tracing::error!(error = %err, "socket client error");
                    }
                });
            }
        }
    }

    if socket.exists() {
        let _ = fs::remove_file(&socket);
    }
    Ok(())
}

async fn handle_socket_client(
    stream: UnixStream,
    ctx: DaemonContext,
    publish_tx: mpsc::Sender<PublishJob>,
    shutdown_tx: broadcast::Sender<()>,
) -> Result<(), DaemonError> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| io_err("daemon socket read", e))?
    {
        if line.trim().is_empty() {
            continue;
        }

        let request: DaemonRequest = match serde_json::from_str(&line) {
            Ok(request) => request,
            Err(err) => {
                write_response(
                    &mut writer,
                    &DaemonResponse::error(format!("invalid request JSON: {err}")),
                )
                .await?;
                continue;
            }
        };

        let response = match request.cmd.as_str() {
            CMD_STATUS => DaemonResponse::ok(build_status_payload(&ctx).await),
            CMD_PUBLISH => {
                let target = match request.tenant {
                    Some(tenant) => PublishTarget::Tenant(TenantId::new(tenant)),
                    None => PublishTarget::All,
                };
                match enqueue_publish(&publish_tx, target, "socket").await {
                    Ok(summary) => DaemonResponse::ok(json!(summary)),
                    Err(err) => DaemonResponse::error(err.to_string()),
                }
            }
            CMD_STOP => {
                let _ = shutdown_tx.send(());
                DaemonResponse::ok(json!({ "stopping": true }))
            }
            other => DaemonResponse::error(format!("unknown command '{other}'")),
        };

        write_response(&mut writer, &response).await?;
        if request.cmd == CMD_STOP {
            break;
        }
    }

    Ok(())
}

async fn build_status_payload(ctx: &DaemonContext) -> Value {
    let records = ctx.records.read().await.clone();

    let tenants: Vec<Value> = ctx
        .watched
        .iter()
        .map(|watched| {
            let record = records.get(&watched.tenant).cloned().unwrap_or_default();
            json!({
                "tenant": watched.tenant.to_string(),
                "draft": watched.draft.display().to_string(),
                "last_publish_at_unix": record.last_publish_at_unix,
                "used_fallback": record.used_fallback,
                "checkpoint": record.checkpoint,
                "nonce": record.nonce,
                "last_error": record.last_error,
            })
        })
        .collect();

    let last_publish_at_unix = records
        .values()
        .map(|r| r.last_publish_at_unix)
        .max()
        .unwrap_or(0);

    json!({
        "running": true,
        "profile": ctx.profile,
        "pid": std::process::id(),
        "started_at_unix": ctx.started_at_unix,
        "last_publish_at_unix": last_publish_at_unix,
        "tenants": tenants,
        "socket": socket_path(&ctx.home).display().to_string(),
    })
}

fn prepare_socket_for_bind(socket: &Path) -> Result<(), DaemonError> {
    if !socket.exists() {
        return Ok(());
    }

    if StdUnixStream::connect(socket).is_ok() {
        return Err(DaemonError::Protocol(format!(
            "daemon socket already in use: {}",
            socket.display()
        )));
    }
    tracing::warn!(socket = %socket.display(), "removing stale daemon socket before bind");

    match fs::remove_file(socket) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(io_err(socket, err)),
    }
}

async fn write_response(
    writer: &mut OwnedWriteHalf,
    response: &DaemonResponse,
) -> Result<(), DaemonError> {
    let mut payload = serde_json::to_string(response)?;
    payload.push('\n');
    writer
        .write_all(payload.as_bytes())
        .await
        .map_err(|e| io_err("daemon socket write", e))?;
    writer
        .flush()
        .await
        .map_err(|e| io_err("daemon socket flush", e))
}

#[cfg(unix)]
fn set_socket_permissions(path: &Path) -> Result<(), DaemonError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(|e| io_err(path, e))
}

// ---------------------------------------------------------------------------
// Housekeeping
// ---------------------------------------------------------------------------

async fn log_rotation_task(
    home: PathBuf,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    let mut interval = tokio::time::interval(Duration::from_secs(5));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    interval.tick().await;

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            _ = interval.tick() => {
                let home = home.clone();
                // rotate_logs logs its own failures
                let _ = tokio::task::spawn_blocking(move || crate::log_rotation::rotate_logs(&home)).await;
            }
        }
    }
    Ok(())
}

fn ensure_runtime_dirs(home: &Path) -> Result<(), DaemonError> {
    for dir in [run_dir(home), logs_dir(home)] {
        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;
        }
    }
    Ok(())
}

fn handle_join(
    task: &str,
    result: Result<Result<(), DaemonError>, tokio::task::JoinError>,
) -> Result<(), DaemonError> {
    match result {
        Ok(inner) => inner,
        Err(err) => Err(DaemonError::Protocol(format!(
            "{task} task join failure: {err}"
        ))),
    }
}

fn unix_seconds_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use livedoc_core::{document, WatchEntry};
    use livedoc_sync::MemoryStore;
    use tempfile::TempDir;

    use super::*;

    fn context(home: &TempDir, drafts: &[(&str, &str, &str)]) -> DaemonContext {
        let mut profile = Profile::local("default", home.path().join("store"), TenantId::default());
        for (tenant, name, body) in drafts {
            let path = home.path().join(name);
            fs::write(&path, body).expect("write draft");
            profile.watch.push(WatchEntry {
                tenant: TenantId::from(*tenant),
                draft: path,
            });
        }
        DaemonContext::new(home.path().to_path_buf(), &profile, Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn status_payload_before_any_publish() {
        let home = TempDir::new().expect("home");
        let ctx = context(&home, &[("vendor", "catalog.json", "{}")]);

        let payload = build_status_payload(&ctx).await;
        assert_eq!(payload["running"], json!(true));
        assert_eq!(payload["profile"], json!("default"));
        assert_eq!(payload["last_publish_at_unix"], json!(0u64));

        let tenants = payload["tenants"].as_array().expect("tenants");
        assert_eq!(tenants.len(), 1);
        assert_eq!(tenants[0]["tenant"], json!("vendor"));
        assert_eq!(tenants[0]["used_fallback"], json!(false));
    }

    #[tokio::test]
    async fn publish_job_records_tenant_state() {
        let home = TempDir::new().expect("home");
        let ctx = context(
            &home,
            &[
                ("acme", "acme.json", r#"{ "items": [1] }"#),
                ("globex", "globex.json", r#"{ "items": [2] }"#),
            ],
        );

        let before = unix_seconds_now();
        let summary = run_publish_job(&ctx, &PublishTarget::All, "test")
            .await
            .expect("publish");
        assert_eq!(summary.published.len(), 2);
        assert!(summary.failed.is_empty());

        let live = ctx.store.get_live(&TenantId::from("globex")).expect("live");
        assert_eq!(live["items"], json!([2]));
        assert_eq!(
            document::stamp_nonce(&live),
            Some(summary.published[1].nonce.as_str())
        );

        let records = ctx.records.read().await;
        let acme = records.get(&TenantId::from("acme")).expect("acme record");
        assert!(acme.last_publish_at_unix >= before);
        assert!(!acme.used_fallback);
        assert!(acme.last_error.is_none());
    }

    #[tokio::test]
    async fn tenant_target_only_publishes_that_tenant() {
        let home = TempDir::new().expect("home");
        let ctx = context(
            &home,
            &[("acme", "acme.json", "{}"), ("globex", "globex.json", "{}")],
        );

        let summary = run_publish_job(&ctx, &PublishTarget::Tenant("globex".into()), "test")
            .await
            .expect("publish");
        assert_eq!(summary.published.len(), 1);
        assert_eq!(summary.published[0].tenant, "globex");
        assert!(ctx.records.read().await.get(&TenantId::from("acme")).is_none());
    }

    #[tokio::test]
    async fn unknown_tenant_is_a_protocol_error() {
        let home = TempDir::new().expect("home");
        let ctx = context(&home, &[("acme", "acme.json", "{}")]);
        let err = run_publish_job(&ctx, &PublishTarget::Tenant("nobody".into()), "test")
            .await
            .unwrap_err();
        assert!(matches!(err, DaemonError::Protocol(_)));
    }

    #[tokio::test]
    async fn broken_draft_is_reported_and_recorded() {
        let home = TempDir::new().expect("home");
        let ctx = context(&home, &[("acme", "acme.json", "{ not json")]);

        let summary = run_publish_job(&ctx, &PublishTarget::All, "test")
            .await
            .expect("job");
        assert_eq!(summary.failed.len(), 1);
        assert!(!summary.failed[0].terminal_fallback);

        let records = ctx.records.read().await;
        let acme = records.get(&TenantId::from("acme")).expect("record");
        assert!(acme.last_error.as_deref().unwrap_or_default().contains("acme.json"));
        assert_eq!(acme.last_publish_at_unix, 0);
    }

    #[test]
    fn draft_target_matches_resolved_path() {
        let home = TempDir::new().expect("home");
        let ctx = context(&home, &[("acme", "acme.json", "{}")]);
        let draft = ctx.watched[0].draft.clone();
        assert!(PublishTarget::Draft(draft).matches(&ctx.watched[0]));
        assert!(!PublishTarget::Draft(home.path().join("other.json")).matches(&ctx.watched[0]));
    }
}
