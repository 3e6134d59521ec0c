// ABOUTME: D-Bus interface exposing the power-limit switch to settings front-ends.
// ABOUTME: Front-ends read the switch through properties and flip it through SetLimited.

use std::sync::{Arc, Mutex};

use powerlimit_ipc::PowerLimitStatus;

use crate::config::Config;
use crate::persistence;
use crate::preference::PowerLimitSettings;

/// Shared daemon state readable by the D-Bus interface and the main task.
#[derive(Clone)]
pub struct SharedState {
    inner: Arc<Mutex<SharedStateInner>>,
    shutdown_signal: Arc<tokio::sync::Notify>,
}

struct SharedStateInner {
    settings: PowerLimitSettings,
    config: Config,
    last_error: String,
}

impl SharedState {
    pub fn new(settings: PowerLimitSettings, config: Config) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SharedStateInner {
                settings,
                config,
                last_error: String::new(),
            })),
            shutdown_signal: Arc::new(tokio::sync::Notify::new()),
        }
    }

    pub fn limited(&self) -> bool {
        self.inner.lock().unwrap().settings.is_checked()
    }

    fn node_path(&self) -> String {
        self.inner.lock().unwrap().settings.node().path().display().to_string()
    }

    fn node_present(&self) -> bool {
        self.inner.lock().unwrap().settings.node().exists()
    }

    fn last_error(&self) -> String {
        self.inner.lock().unwrap().last_error.clone()
    }

    pub fn status(&self) -> PowerLimitStatus {
        let inner = self.inner.lock().unwrap();
        let node = inner.settings.node();
        PowerLimitStatus {
            limited: inner.settings.is_checked(),
            node_path: node.path().display().to_string(),
            node_present: node.exists(),
            last_error: inner.last_error.clone(),
        }
    }

    /// Offer a new value to the switch. On success the value is remembered
    /// for restore-on-start; on failure the error is kept for LastError.
    pub fn set_limited(&self, limited: bool) -> bool {
        let mut inner = self.inner.lock().unwrap();
        if !inner.settings.set_limited(limited) {
            inner.last_error = format!(
                "Failed to write {} to {}",
                u8::from(limited),
                inner.settings.node().path().display()
            );
            return false;
        }
        inner.last_error.clear();
        let state_path = inner.config.state_path();
        if let Err(e) = persistence::save_state(&state_path, limited) {
            tracing::warn!("Failed to save power limit state: {e}");
        }
        true
    }

    pub fn refresh(&self) -> bool {
        self.inner.lock().unwrap().settings.refresh()
    }

    pub fn request_shutdown(&self) {
        self.shutdown_signal.notify_one();
    }

    pub async fn shutdown_requested(&self) {
        self.shutdown_signal.notified().await;
    }
}

/// D-Bus interface implementation served by the daemon.
pub struct DaemonInterface {
    shared: SharedState,
}

impl DaemonInterface {
    pub fn new(shared: SharedState) -> Self {
        Self { shared }
    }

    pub async fn notify_limited(connection: &zbus::Connection) {
        let Ok(iface_ref) = connection
            .object_server()
            .interface::<_, DaemonInterface>(powerlimit_ipc::OBJECT_PATH)
            .await
        else {
            return;
        };
        let _ = iface_ref
            .get()
            .await
            .limited_changed(iface_ref.signal_emitter())
            .await;
    }

    pub async fn notify_last_error(connection: &zbus::Connection) {
        let Ok(iface_ref) = connection
            .object_server()
            .interface::<_, DaemonInterface>(powerlimit_ipc::OBJECT_PATH)
            .await
        else {
            return;
        };
        let _ = iface_ref
            .get()
            .await
            .last_error_changed(iface_ref.signal_emitter())
            .await;
    }
}

#[zbus::interface(name = "org.lineageos.PowerLimit1")]
impl DaemonInterface {
    #[zbus(property)]
    fn limited(&self) -> bool {
        self.shared.limited()
    }

    #[zbus(property)]
    fn node_path(&self) -> String {
        self.shared.node_path()
    }

    #[zbus(property)]
    fn node_present(&self) -> bool {
        self.shared.node_present()
    }

    #[zbus(property)]
    fn last_error(&self) -> String {
        self.shared.last_error()
    }

    async fn set_limited(
        &self,
        #[zbus(connection)] connection: &zbus::Connection,
        limited: bool,
    ) -> bool {
        let accepted = self.shared.set_limited(limited);
        if accepted {
            tracing::info!("Power limit switched {} via D-Bus", powerlimit_ipc::on_off(limited));
            DaemonInterface::notify_limited(connection).await;
        }
        DaemonInterface::notify_last_error(connection).await;
        accepted
    }

    async fn refresh(&self, #[zbus(connection)] connection: &zbus::Connection) -> bool {
        let limited = self.shared.refresh();
        tracing::info!("Node re-read via D-Bus: {}", powerlimit_ipc::on_off(limited));
        DaemonInterface::notify_limited(connection).await;
        limited
    }

    async fn describe(&self) -> zbus::fdo::Result<String> {
        serde_json::to_string(&self.shared.status()).map_err(|e| {
            zbus::fdo::Error::Failed(format!("Failed to serialize status: {e}"))
        })
    }

    async fn quit(&self) -> zbus::fdo::Result<()> {
        tracing::info!("Quit requested via D-Bus");
        self.shared.request_shutdown();
        Ok(())
    }
}
