//! Buffer resolution for the idle time reserved around a service.
//!
//! Buffers come from a cascade of overrides: a service can override the
//! studio defaults, and home visits have their own candidates that fall back
//! to the studio-visit values. [`resolve_buffer`] picks the first candidate
//! that is a positive number; [`buffer_candidates`] encodes the cascade
//! ordering.

/// Hard fallback applied when no override in the cascade is positive.
pub const DEFAULT_BUFFER_MINUTES: i64 = 30;

/// Which side of the service occupation a buffer pads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
    Before,
    After,
}

/// Nullable buffer overrides carried by a service or by the studio settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BufferOverrides {
    pub before_minutes: Option<i64>,
    pub after_minutes: Option<i64>,
    pub home_before_minutes: Option<i64>,
    pub home_after_minutes: Option<i64>,
}

/// First candidate strictly greater than zero, scanned left to right; 0 when
/// none qualifies.
pub fn resolve_buffer(candidates: &[Option<i64>]) -> i64 {
    candidates
        .iter()
        .flatten()
        .copied()
        .find(|minutes| *minutes > 0)
        .unwrap_or(0)
}

/// Candidate list for one buffer side, in cascade priority order.
///
/// Home visits try the home-specific overrides first, then fall back to the
/// studio-visit cascade; both end on the hard default so a resolved buffer is
/// never silently zero.
pub fn buffer_candidates(
    kind: BufferKind,
    home_visit: bool,
    service: &BufferOverrides,
    studio: &BufferOverrides,
) -> Vec<Option<i64>> {
    let (service_home, studio_home, service_base, studio_base) = match kind {
        BufferKind::Before => (
            service.home_before_minutes,
            studio.home_before_minutes,
            service.before_minutes,
            studio.before_minutes,
        ),
        BufferKind::After => (
            service.home_after_minutes,
            studio.home_after_minutes,
            service.after_minutes,
            studio.after_minutes,
        ),
    };

    if home_visit {
        vec![
            service_home,
            studio_home,
            service_base,
            studio_base,
            Some(DEFAULT_BUFFER_MINUTES),
        ]
    } else {
        vec![service_base, studio_base, Some(DEFAULT_BUFFER_MINUTES)]
    }
}

/// Resolved buffer for a service + visit kind, in minutes.
pub fn effective_buffer(
    kind: BufferKind,
    home_visit: bool,
    service: &BufferOverrides,
    studio: &BufferOverrides,
) -> i64 {
    resolve_buffer(&buffer_candidates(kind, home_visit, service, studio))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_buffer_first_positive_wins() {
        assert_eq!(resolve_buffer(&[None, Some(0), Some(-5), Some(12), Some(30)]), 12);
    }

    #[test]
    fn test_resolve_buffer_none_qualify() {
        assert_eq!(resolve_buffer(&[None, Some(0), Some(-1)]), 0);
        assert_eq!(resolve_buffer(&[]), 0);
    }

    #[test]
    fn test_studio_cascade_falls_back_to_default() {
        let service = BufferOverrides::default();
        let studio = BufferOverrides::default();
        assert_eq!(
            effective_buffer(BufferKind::Before, false, &service, &studio),
            DEFAULT_BUFFER_MINUTES
        );
    }

    #[test]
    fn test_service_override_beats_studio_default() {
        let service = BufferOverrides {
            before_minutes: Some(10),
            ..Default::default()
        };
        let studio = BufferOverrides {
            before_minutes: Some(20),
            ..Default::default()
        };
        assert_eq!(effective_buffer(BufferKind::Before, false, &service, &studio), 10);
    }

    #[test]
    fn test_home_visit_prefers_home_candidates() {
        let service = BufferOverrides {
            before_minutes: Some(10),
            home_before_minutes: Some(45),
            ..Default::default()
        };
        let studio = BufferOverrides::default();
        assert_eq!(effective_buffer(BufferKind::Before, true, &service, &studio), 45);
        // Without a home override the home visit falls back to the base cascade.
        let service = BufferOverrides {
            before_minutes: Some(10),
            ..Default::default()
        };
        assert_eq!(effective_buffer(BufferKind::Before, true, &service, &studio), 10);
    }

    #[test]
    fn test_zero_override_does_not_shadow_cascade() {
        let service = BufferOverrides {
            after_minutes: Some(0),
            ..Default::default()
        };
        let studio = BufferOverrides {
            after_minutes: Some(15),
            ..Default::default()
        };
        assert_eq!(effective_buffer(BufferKind::After, false, &service, &studio), 15);
    }
}
