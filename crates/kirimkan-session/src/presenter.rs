//! Pairing-code presenters.

use std::time::Duration;

/// Shows pairing codes to the operator.
///
/// Each call supersedes the previously presented code.
pub trait PairingPresenter: Send + Sync {
    /// Present a fresh pairing code.
    fn present(&self, code: &str, timeout: Duration);
}

/// Writes pairing codes to the log as plain text.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogPresenter;

impl PairingPresenter for LogPresenter {
    fn present(&self, code: &str, timeout: Duration) {
        tracing::info!(
            code,
            valid_for_secs = timeout.as_secs(),
            "Pairing code issued"
        );
    }
}

/// Renders pairing codes as half-block QR codes on stdout (requires `qr` feature).
#[cfg(feature = "qr")]
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalQrPresenter;

#[cfg(feature = "qr")]
impl TerminalQrPresenter {
    /// Render `code` as a terminal QR code.
    ///
    /// # Errors
    /// Returns error if the payload does not fit in a QR code.
    pub fn render(code: &str) -> Result<String, qrcode::types::QrError> {
        use qrcode::{EcLevel, QrCode, render::unicode};

        let qr = QrCode::with_error_correction_level(code.as_bytes(), EcLevel::L)?;
        Ok(qr
            .render::<unicode::Dense1x2>()
            .dark_color(unicode::Dense1x2::Light)
            .light_color(unicode::Dense1x2::Dark)
            .build())
    }
}

#[cfg(feature = "qr")]
impl PairingPresenter for TerminalQrPresenter {
    fn present(&self, code: &str, timeout: Duration) {
        match Self::render(code) {
            Ok(image) => {
                tracing::info!(
                    valid_for_secs = timeout.as_secs(),
                    "Scan the QR code below to link this device"
                );
                println!("{image}");
            }
            Err(e) => {
                tracing::warn!("Failed to render QR code ({e}), falling back to text");
                LogPresenter.present(code, timeout);
            }
        }
    }
}

#[cfg(all(test, feature = "qr"))]
mod tests {
    use super::*;

    #[test]
    fn test_render_produces_half_blocks() {
        let image = TerminalQrPresenter::render("2@loopback,abc,def,ghi").unwrap();
        assert!(image.lines().count() > 10);
        assert!(image.contains('▀') || image.contains('▄') || image.contains('█'));
    }
}
