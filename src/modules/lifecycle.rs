// Application lifecycle state machine - no Tauri imports.
//
// Starting -> Running -> (all windows closed) -> Terminated | IdleResident
// IdleResident -> (activated) -> Running

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Starting,
    Running,
    IdleResident,
    Terminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Content filter settled and the first window is up.
    Ready,
    AllWindowsClosed,
    /// Dock click, or a second launch of the app.
    Activated { open_windows: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    CreateWindow,
    Exit,
    StayResident,
}

/// What the platform expects when the last window closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosePolicy {
    QuitOnLastWindow,
    StayResident,
}

impl ClosePolicy {
    pub fn for_current_platform() -> Self {
        if cfg!(target_os = "macos") {
            Self::StayResident
        } else {
            Self::QuitOnLastWindow
        }
    }
}

pub fn transition(phase: Phase, event: LifecycleEvent, policy: ClosePolicy) -> (Phase, Action) {
    use LifecycleEvent::*;

    match (phase, event) {
        (Phase::Starting, Ready) => (Phase::Running, Action::None),
        // Window creation is already on its way.
        (Phase::Starting, _) => (Phase::Starting, Action::None),

        (Phase::Running, AllWindowsClosed) => match policy {
            ClosePolicy::QuitOnLastWindow => (Phase::Terminated, Action::Exit),
            ClosePolicy::StayResident => (Phase::IdleResident, Action::StayResident),
        },
        (Phase::Running, Activated { open_windows: 0 }) => (Phase::Running, Action::CreateWindow),
        (Phase::Running, _) => (Phase::Running, Action::None),

        (Phase::IdleResident, Activated { open_windows: 0 }) => (Phase::Running, Action::CreateWindow),
        (Phase::IdleResident, Activated { .. }) => (Phase::Running, Action::None),
        (Phase::IdleResident, AllWindowsClosed) => (Phase::IdleResident, Action::StayResident),
        (Phase::IdleResident, Ready) => (Phase::IdleResident, Action::None),

        (Phase::Terminated, _) => (Phase::Terminated, Action::None),
    }
}

/// How the content filter enters the session. The window opens in every case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterStartup {
    /// Freshly fetched lists are in force.
    Fresh { lines: usize },
    /// The fetch failed; the engine cached by an earlier run stays in force.
    Cached,
    /// The fetch failed and there is nothing cached.
    Unprotected,
}

/// `fetched` is the outcome of the ruleset fetch, `has_cache` whether an
/// engine from an earlier run was already loaded.
pub fn filter_startup<E>(fetched: &Result<usize, E>, has_cache: bool) -> FilterStartup {
    match fetched {
        Ok(lines) => FilterStartup::Fresh { lines: *lines },
        Err(_) if has_cache => FilterStartup::Cached,
        Err(_) => FilterStartup::Unprotected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Ok(120), false, FilterStartup::Fresh { lines: 120 })]
    #[case(Ok(120), true, FilterStartup::Fresh { lines: 120 })]
    #[case(Err("timed out"), true, FilterStartup::Cached)]
    #[case(Err("timed out"), false, FilterStartup::Unprotected)]
    fn test_filter_startup(
        #[case] fetched: Result<usize, &str>,
        #[case] has_cache: bool,
        #[case] expected: FilterStartup,
    ) {
        assert_eq!(filter_startup(&fetched, has_cache), expected);
    }

    #[test]
    fn test_startup_enters_running() {
        let (phase, action) = transition(Phase::Starting, LifecycleEvent::Ready, ClosePolicy::QuitOnLastWindow);
        assert_eq!(phase, Phase::Running);
        assert_eq!(action, Action::None);
    }

    #[test]
    fn test_activate_during_startup_is_ignored() {
        let (phase, action) = transition(
            Phase::Starting,
            LifecycleEvent::Activated { open_windows: 0 },
            ClosePolicy::StayResident,
        );
        assert_eq!(phase, Phase::Starting);
        assert_eq!(action, Action::None);
    }

    #[rstest]
    #[case(ClosePolicy::QuitOnLastWindow, Phase::Terminated, Action::Exit)]
    #[case(ClosePolicy::StayResident, Phase::IdleResident, Action::StayResident)]
    fn test_last_window_closed(#[case] policy: ClosePolicy, #[case] phase: Phase, #[case] action: Action) {
        assert_eq!(
            transition(Phase::Running, LifecycleEvent::AllWindowsClosed, policy),
            (phase, action)
        );
    }

    #[rstest]
    #[case(Phase::Running)]
    #[case(Phase::IdleResident)]
    fn test_activate_without_windows_recreates(#[case] from: Phase) {
        let (phase, action) = transition(
            from,
            LifecycleEvent::Activated { open_windows: 0 },
            ClosePolicy::StayResident,
        );
        assert_eq!(phase, Phase::Running);
        assert_eq!(action, Action::CreateWindow);
    }

    #[test]
    fn test_activate_with_window_does_nothing() {
        let (phase, action) = transition(
            Phase::Running,
            LifecycleEvent::Activated { open_windows: 1 },
            ClosePolicy::StayResident,
        );
        assert_eq!(phase, Phase::Running);
        assert_eq!(action, Action::None);
    }

    #[test]
    fn test_terminated_is_final() {
        for event in [
            LifecycleEvent::Ready,
            LifecycleEvent::AllWindowsClosed,
            LifecycleEvent::Activated { open_windows: 0 },
        ] {
            assert_eq!(
                transition(Phase::Terminated, event, ClosePolicy::QuitOnLastWindow),
                (Phase::Terminated, Action::None)
            );
        }
    }

    #[test]
    fn test_resident_cycle() {
        let policy = ClosePolicy::StayResident;
        let mut phase = Phase::Starting;
        let mut actions = Vec::new();
        for event in [
            LifecycleEvent::Ready,
            LifecycleEvent::AllWindowsClosed,
            LifecycleEvent::Activated { open_windows: 0 },
            LifecycleEvent::AllWindowsClosed,
        ] {
            let (next, action) = transition(phase, event, policy);
            phase = next;
            actions.push(action);
        }
        assert_eq!(phase, Phase::IdleResident);
        assert_eq!(
            actions,
            vec![Action::None, Action::StayResident, Action::CreateWindow, Action::StayResident]
        );
    }
}
