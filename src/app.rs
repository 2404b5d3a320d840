use log::{error, info};

use crate::devices::Led;
use crate::errors::Error;
use crate::hardware::{DEFAULT_LED_PIN, Gpio};
use crate::store::{DocPath, DocumentStore, FlagWatcher};

/// What an enabled flag does to the LED.
#[derive(Copy, Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnablePolicy {
    /// Steady ON while enabled.
    #[default]
    Steady,
    /// Blink at the configured interval while enabled.
    Blink,
}

/// Application settings, deserializable and fully defaulted.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Settings {
    pub pin: u16,
    pub document: DocPath,
    pub field: String,
    pub blink_interval_ms: u64,
    pub on_enable: EnablePolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pin: DEFAULT_LED_PIN,
            document: DocPath::new("LED", "status"),
            field: String::from("isEnabled"),
            blink_interval_ms: 1000,
            on_enable: EnablePolicy::Steady,
        }
    }
}

/// Wires a [`FlagWatcher`] to a [`Led`]: the application itself.
///
/// [`LedMirror::start`] attaches the LED and subscribes to the flag;
/// [`LedMirror::shutdown`] cancels the watcher and releases the pin. Both
/// halves degrade and log, nothing here is fatal.
#[derive(Debug)]
pub struct LedMirror {
    led: Led,
    watcher: FlagWatcher,
}

impl LedMirror {
    /// Attaches the LED and starts mirroring the remote flag onto it.
    ///
    /// # Errors
    /// Returns a `StoreError` if the store subscription cannot be opened. A
    /// failed pin open is not an error here: the LED degrades to no-ops.
    pub fn start(
        driver: Box<dyn Gpio>,
        store: &dyn DocumentStore,
        settings: Settings,
    ) -> Result<Self, Error> {
        let led = Led::attach(driver, settings.pin);
        info!(
            "{} mirrors '{}' field '{}' ({:?} on enable)",
            led, settings.document, settings.field, settings.on_enable
        );

        let mirror = led.clone();
        let policy = settings.on_enable;
        let interval_ms = settings.blink_interval_ms;
        let watcher = FlagWatcher::subscribe(
            store,
            settings.document,
            &settings.field,
            move |enabled| {
                let led = mirror.clone();
                async move {
                    match (enabled, policy) {
                        (true, EnablePolicy::Blink) => {
                            led.blink(interval_ms);
                        }
                        (true, EnablePolicy::Steady) => {
                            led.stop_blink().await;
                            if let Err(err) = led.turn_on() {
                                error!("{}", err);
                            }
                        }
                        (false, _) => {
                            led.stop_blink().await;
                            if let Err(err) = led.turn_off() {
                                error!("{}", err);
                            }
                        }
                    }
                }
            },
        )?;

        Ok(Self { led, watcher })
    }

    pub fn led(&self) -> &Led {
        &self.led
    }

    /// Stops mirroring and releases the pin. Idempotent.
    pub async fn shutdown(&self) {
        self.watcher.cancel();
        self.led.close().await;
        info!("LED mirror stopped");
    }
}

#[cfg(test)]
mod tests {
    use crate::devices::{LedState, Stage};
    use crate::mocks::gpio::MockGpio;
    use crate::pause;
    use crate::store::MemoryStore;
    use crate::utils::state::State;

    use super::*;

    fn enabled_payload(value: bool) -> State {
        State::Object(std::collections::HashMap::from([(
            String::from("isEnabled"),
            State::Boolean(value),
        )]))
    }

    fn blink_settings() -> Settings {
        Settings {
            on_enable: EnablePolicy::Blink,
            ..Settings::default()
        }
    }

    fn start_mirror(driver: &MockGpio, store: &MemoryStore, settings: Settings) -> LedMirror {
        LedMirror::start(Box::new(driver.clone()), store, settings)
            .expect("Mirror should start")
    }

    #[test]
    fn test_settings_defaults() {
        let settings: Settings =
            serde_json::from_str("{}").expect("Empty settings deserialize");
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.pin, DEFAULT_LED_PIN);
        assert_eq!(settings.document, DocPath::new("LED", "status"));
        assert_eq!(settings.field, "isEnabled");
        assert_eq!(settings.blink_interval_ms, 1000);
        assert_eq!(settings.on_enable, EnablePolicy::Steady);
    }

    #[test]
    fn test_settings_policy_parsing() {
        let settings: Settings = serde_json::from_str(r#"{"on_enable": "blink"}"#)
            .expect("Settings deserialize");
        assert_eq!(settings.on_enable, EnablePolicy::Blink);
    }

    #[tokio::test(start_paused = true)]
    async fn test_steady_policy_mirrors_flag() {
        let driver = MockGpio::default();
        let store = MemoryStore::new();
        let path = DocPath::new("LED", "status");
        let mirror = start_mirror(&driver, &store, Settings::default());

        store.set(&path, enabled_payload(true));
        pause!(10);
        assert_eq!(mirror.led().get_stage(), Stage::SteadyOn);
        assert_eq!(driver.get_level(6), Some(true));

        store.set(&path, enabled_payload(false));
        pause!(10);
        assert_eq!(mirror.led().get_stage(), Stage::SteadyOff);
        assert_eq!(driver.get_level(6), Some(false));
    }

    #[tokio::test(start_paused = true)]
    async fn test_blink_policy_starts_blinking() {
        // The flag turns true under the blink policy.
        let driver = MockGpio::default();
        let store = MemoryStore::new();
        let path = DocPath::new("LED", "status");
        let mirror = start_mirror(&driver, &store, blink_settings());

        store.set(&path, enabled_payload(true));
        pause!(3510);

        assert!(mirror.led().is_blinking());
        let writes = driver.get_writes();
        assert_eq!(
            &writes[..4],
            &[(6, true), (6, false), (6, true), (6, false)],
            "Pin alternates at the configured interval"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_disable_stops_blink_and_lands_low() {
        // The flag turns false while the LED is blinking.
        let driver = MockGpio::default();
        let store = MemoryStore::new();
        let path = DocPath::new("LED", "status");
        let mirror = start_mirror(&driver, &store, blink_settings());

        store.set(&path, enabled_payload(true));
        pause!(2500);
        assert!(mirror.led().is_blinking());

        store.set(&path, enabled_payload(false));
        pause!(10);

        assert!(!mirror.led().is_blinking());
        assert_eq!(mirror.led().get_stage(), Stage::SteadyOff);
        assert_eq!(driver.get_level(6), Some(false), "Pin lands LOW");
    }

    #[tokio::test(start_paused = true)]
    async fn test_final_state_equals_last_delivered_value() {
        let driver = MockGpio::default();
        let store = MemoryStore::new();
        let path = DocPath::new("LED", "status");
        let mirror = start_mirror(&driver, &store, Settings::default());

        for value in [true, false, false, true, true, false, true] {
            store.set(&path, enabled_payload(value));
        }
        pause!(50);

        assert_eq!(mirror.led().get_state(), LedState::On);
        assert_eq!(driver.get_level(6), Some(true));
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_update_is_ignored() {
        // A malformed payload arrives mid-stream.
        let driver = MockGpio::default();
        let store = MemoryStore::new();
        let path = DocPath::new("LED", "status");
        let mirror = start_mirror(&driver, &store, Settings::default());

        store.set(&path, enabled_payload(true));
        pause!(10);
        store.set(&path, State::Object(std::collections::HashMap::new()));
        pause!(10);

        assert_eq!(
            mirror.led().get_stage(),
            Stage::SteadyOn,
            "State is unchanged after a malformed update"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_failure_never_crashes() {
        // The pin cannot be claimed at startup.
        let driver = MockGpio::default().with_open_failure();
        let store = MemoryStore::new();
        let path = DocPath::new("LED", "status");
        let mirror = start_mirror(&driver, &store, blink_settings());

        store.set(&path, enabled_payload(true));
        store.set(&path, enabled_payload(false));
        pause!(50);

        assert_eq!(mirror.led().get_stage(), Stage::Idle);
        assert!(driver.get_writes().is_empty(), "Every write is a no-op");

        mirror.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_is_idempotent() {
        let driver = MockGpio::default();
        let store = MemoryStore::new();
        let path = DocPath::new("LED", "status");
        let mirror = start_mirror(&driver, &store, Settings::default());

        store.set(&path, enabled_payload(true));
        pause!(10);

        mirror.shutdown().await;
        mirror.shutdown().await;

        assert_eq!(driver.close_count(6), 1, "Pin is released exactly once");
        assert_eq!(driver.get_level(6), None);

        // Updates after shutdown no longer reach the LED.
        store.set(&path, enabled_payload(false));
        pause!(10);
        assert_eq!(mirror.led().get_stage(), Stage::Idle);
    }
}
