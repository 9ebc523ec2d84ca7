/// Scheduling hint for [`Effect::run`](super::Effect::run).
///
/// Priority never affects correctness. Lower priorities hand control back
/// to the runtime a few times before their operation starts, letting more
/// urgent work go first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Priority {
    Background,
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Number of cooperative yields before the operation starts.
    pub(crate) fn start_yields(self) -> usize {
        match self {
            Self::High | Self::Medium => 0,
            Self::Low => 1,
            Self::Background => 3,
        }
    }
}
