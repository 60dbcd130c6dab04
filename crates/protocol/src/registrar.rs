//! One-shot scheme registration.
//!
//! Webview hosts only accept privileged scheme declarations before the first window or session
//! exists. The [`Registrar`] makes that ordering explicit: it moves through
//! `Unregistered → Registered → Closed` exactly once, and every other transition fails loudly.
//! After registration it owns the immutable [`BindingTable`] that request handlers read.

use crate::binding::{BindingTable, SchemeName};
use crate::error::ProtocolError;
use bitflags::bitflags;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU8, Ordering};
use tracing::info;

bitflags! {
    /// Transport privileges granted to a custom scheme.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SchemePrivileges: u8 {
        /// Parsed like `http`: hierarchical, with origin semantics and relative URL resolution.
        const STANDARD = 1;
        /// Treated as a secure context, like `https`.
        const SECURE = 1 << 1;
        const CORS_ENABLED = 1 << 2;
        const SUPPORT_FETCH_API = 1 << 3;
    }
}

impl SchemePrivileges {
    /// Everything needed to behave like a standard secure web origin.
    pub const WEB_ORIGIN: Self = Self::STANDARD
        .union(Self::SECURE)
        .union(Self::CORS_ENABLED)
        .union(Self::SUPPORT_FETCH_API);
}

/// One declared scheme, handed to the host's webview builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemeRegistration {
    pub scheme: SchemeName,
    pub privileges: SchemePrivileges,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Phase {
    Unregistered = 0,
    Registered = 1,
    Closed = 2,
}

impl Phase {
    const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Unregistered,
            1 => Self::Registered,
            _ => Self::Closed,
        }
    }
}

/// Init-once, teardown-once registration state.
///
/// The binding table is written once and then only read, so lookups never take a lock.
#[derive(Debug)]
pub struct Registrar {
    phase: AtomicU8,
    bindings: OnceLock<BindingTable>,
}

impl Default for Registrar {
    fn default() -> Self {
        Self::new()
    }
}

impl Registrar {
    #[must_use]
    pub const fn new() -> Self {
        Self { phase: AtomicU8::new(Phase::Unregistered as u8), bindings: OnceLock::new() }
    }

    /// The process-wide registrar.
    pub fn global() -> &'static Self {
        static GLOBAL: Registrar = Registrar::new();
        &GLOBAL
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        Phase::from_u8(self.phase.load(Ordering::Acquire))
    }

    /// Declares every binding as a privileged scheme and takes ownership of the table.
    ///
    /// # Errors
    /// [`ProtocolError::Registration`] if the table is empty, or if this registrar has already
    /// been registered or closed. Callers should treat this as fatal at startup.
    pub fn register(&self, bindings: BindingTable) -> Result<Vec<SchemeRegistration>, ProtocolError> {
        let phase = self.phase();
        if phase != Phase::Unregistered {
            return Err(ProtocolError::Registration {
                message: format!("Schemes cannot be registered in phase {phase:?}").into(),
                context: Some("Registration must happen exactly once, before serving".into()),
            });
        }
        if bindings.is_empty() {
            return Err(ProtocolError::registration("No scheme bindings to register"));
        }

        let registrations: Vec<_> = bindings
            .sorted()
            .into_iter()
            .map(|b| SchemeRegistration {
                scheme: b.scheme().clone(),
                privileges: SchemePrivileges::WEB_ORIGIN,
            })
            .collect();

        // A concurrent registration that won the race already owns the slot.
        self.bindings
            .set(bindings)
            .map_err(|_| ProtocolError::registration("Schemes were registered concurrently"))?;
        self.phase.store(Phase::Registered as u8, Ordering::Release);

        for registration in &registrations {
            info!(scheme = %registration.scheme, privileges = ?registration.privileges, "Registered privileged scheme");
        }

        Ok(registrations)
    }

    /// The registered binding table.
    ///
    /// # Errors
    /// [`ProtocolError::Registration`] before registration or after [`close`](Self::close).
    pub fn bindings(&self) -> Result<BindingTable, ProtocolError> {
        match (self.phase(), self.bindings.get()) {
            (Phase::Registered, Some(table)) => Ok(table.clone()),
            (phase, _) => Err(ProtocolError::registration(format!(
                "Binding table is unavailable in phase {phase:?}"
            ))),
        }
    }

    /// Ends the serving lifetime.
    ///
    /// # Errors
    /// [`ProtocolError::Registration`] unless the registrar is currently `Registered`.
    pub fn close(&self) -> Result<(), ProtocolError> {
        self.phase
            .compare_exchange(
                Phase::Registered as u8,
                Phase::Closed as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map(|_| info!("Scheme registrar closed"))
            .map_err(|raw| {
                ProtocolError::registration(format!(
                    "Cannot close registrar in phase {:?}",
                    Phase::from_u8(raw)
                ))
            })
    }
}

/// Registers `bindings` on the process-wide [`Registrar`].
///
/// # Errors
/// See [`Registrar::register`].
pub fn register_schemes(bindings: BindingTable) -> Result<Vec<SchemeRegistration>, ProtocolError> {
    Registrar::global().register(bindings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::{ResolutionPolicy, SchemeBinding};
    use tempfile::tempdir;

    fn table(schemes: &[&str]) -> (tempfile::TempDir, BindingTable) {
        let tmp = tempdir().unwrap();
        let bindings = schemes
            .iter()
            .map(|s| SchemeBinding::new(s, tmp.path(), ResolutionPolicy::Spa).unwrap())
            .collect::<Vec<_>>();
        (tmp, BindingTable::new(bindings).unwrap())
    }

    #[test]
    fn web_origin_has_all_privileges() {
        assert_eq!(SchemePrivileges::WEB_ORIGIN, SchemePrivileges::all());
    }

    #[test]
    fn register_declares_sorted_web_origin_schemes() {
        let (_tmp, table) = table(&["zeta", "app"]);
        let registrar = Registrar::new();

        let declared = registrar.register(table).unwrap();
        let names: Vec<_> = declared.iter().map(|r| r.scheme.as_str()).collect();
        assert_eq!(names, ["app", "zeta"]);
        assert!(declared.iter().all(|r| r.privileges == SchemePrivileges::WEB_ORIGIN));
        assert_eq!(registrar.phase(), Phase::Registered);
        assert_eq!(registrar.bindings().unwrap().len(), 2);
    }

    #[test]
    fn phases_cannot_repeat_or_be_skipped() {
        let registrar = Registrar::new();
        assert!(registrar.bindings().is_err());
        assert!(matches!(registrar.close(), Err(ProtocolError::Registration { .. })));

        let (_tmp, first) = table(&["app"]);
        registrar.register(first).unwrap();

        let (_tmp2, second) = table(&["other"]);
        assert!(matches!(registrar.register(second), Err(ProtocolError::Registration { .. })));

        registrar.close().unwrap();
        assert_eq!(registrar.phase(), Phase::Closed);
        assert!(registrar.close().is_err());
        assert!(registrar.bindings().is_err());

        let (_tmp3, third) = table(&["late"]);
        assert!(registrar.register(third).is_err());
    }

    #[test]
    fn empty_table_is_rejected() {
        let registrar = Registrar::new();
        assert!(registrar.register(BindingTable::default()).is_err());
        assert_eq!(registrar.phase(), Phase::Unregistered);
    }
}
