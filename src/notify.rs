//! User-facing notifications for failed cart operations.
//!
//! The store never returns errors to the UI; it collapses them into one of a
//! fixed set of [`Notice`]s and hands the notice to whatever [`Notify`]
//! implementation the application wired in (a toast layer, typically).

/// A transient user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// Requested quantity exceeds available stock.
    OutOfStock,
    /// Adding a product failed for any other reason.
    AddFailed,
    /// Removing a product failed.
    RemoveFailed,
    /// Changing a product quantity failed.
    UpdateFailed,
}

impl Notice {
    /// The fixed message shown to the user for this notice.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::OutOfStock => "Requested quantity is out of stock",
            Self::AddFailed => "Failed to add product to cart",
            Self::RemoveFailed => "Failed to remove product from cart",
            Self::UpdateFailed => "Failed to change product quantity",
        }
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Sink for user-facing notices.
///
/// Implementations must be cheap and non-blocking; the store calls this
/// inline from its operations.
pub trait Notify: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Default notifier that logs notices through `tracing`.
///
/// Useful for headless consumers and as a fallback before a UI notifier is
/// wired in.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notify for TracingNotifier {
    fn notify(&self, notice: Notice) {
        tracing::warn!(notice = ?notice, "{}", notice.message());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_messages_are_distinct() {
        let notices = [
            Notice::OutOfStock,
            Notice::AddFailed,
            Notice::RemoveFailed,
            Notice::UpdateFailed,
        ];
        for (i, a) in notices.iter().enumerate() {
            for b in notices.iter().skip(i + 1) {
                assert_ne!(a.message(), b.message());
            }
        }
    }

    #[test]
    fn test_display_matches_message() {
        assert_eq!(
            Notice::OutOfStock.to_string(),
            "Requested quantity is out of stock"
        );
    }
}
