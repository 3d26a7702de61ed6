/// Local attention-getting alert. Hosts without a supported desktop get a
/// no-op; the alert is always best-effort and never fails the caller.
pub trait LocalAlert: Send + Sync {
    fn alert(&self, title: &str, body: &str);
}

pub fn platform_alert() -> Box<dyn LocalAlert> {
    #[cfg(target_os = "linux")]
    {
        Box::new(linux::LinuxAlert)
    }
    #[cfg(target_os = "macos")]
    {
        Box::new(macos::MacAlert)
    }
    #[cfg(target_os = "windows")]
    {
        Box::new(windows::WindowsAlert)
    }
    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    {
        Box::new(NoopAlert)
    }
}

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
struct NoopAlert;

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
impl LocalAlert for NoopAlert {
    fn alert(&self, _title: &str, _body: &str) {
        tracing::debug!("No local alert capability on this platform");
    }
}

#[cfg(target_os = "linux")]
mod linux {
    use super::LocalAlert;

    const ALARM_SOUND: &str = "/usr/share/sounds/freedesktop/stereo/alarm-clock-elapsed.oga";

    pub struct LinuxAlert;

    impl LocalAlert for LinuxAlert {
        fn alert(&self, title: &str, body: &str) {
            let shown = notify_rust::Notification::new()
                .summary(title)
                .body(body)
                .appname("icbc-watch")
                .timeout(notify_rust::Timeout::Milliseconds(10000))
                .show();

            if let Err(e) = shown {
                tracing::warn!(error = %e, "Desktop notification failed");
            }

            if let Err(e) = std::process::Command::new("paplay").arg(ALARM_SOUND).spawn() {
                tracing::debug!(error = %e, "Could not play alert sound");
            }
        }
    }
}

#[cfg(target_os = "macos")]
mod macos {
    use super::LocalAlert;

    const ALERT_SOUND: &str = "/System/Library/Sounds/Ping.aiff";

    pub struct MacAlert;

    impl LocalAlert for MacAlert {
        fn alert(&self, title: &str, body: &str) {
            let script = format!(
                "display notification \"{}\" with title \"{}\" sound name \"Glass\"",
                body.replace('"', "'"),
                title.replace('"', "'")
            );

            if let Err(e) = std::process::Command::new("osascript")
                .arg("-e")
                .arg(&script)
                .spawn()
            {
                tracing::warn!(error = %e, "Desktop notification failed");
            }

            if let Err(e) = std::process::Command::new("afplay").arg(ALERT_SOUND).spawn() {
                tracing::debug!(error = %e, "Could not play alert sound");
            }
        }
    }
}

#[cfg(target_os = "windows")]
mod windows {
    use super::LocalAlert;

    pub struct WindowsAlert;

    impl LocalAlert for WindowsAlert {
        fn alert(&self, title: &str, body: &str) {
            let shown = notify_rust::Notification::new()
                .summary(title)
                .body(body)
                .appname("icbc-watch")
                .show();

            if let Err(e) = shown {
                tracing::warn!(error = %e, "Desktop notification failed");
            }
        }
    }
}
