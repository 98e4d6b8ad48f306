/// Collision resolution used when a slot is already taken (build) or empty (lookup).
///
/// Attempt `t = 0` is always the origin slot. Both policies stop after `slots`
/// attempts: linear probing has then visited every slot once, quadratic probing
/// only reaches the slots sharing the origin's parity (`t + t²` is always even).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ProbePolicy {
    Linear,
    #[default]
    Quadratic,
}

impl ProbePolicy {
    pub fn offset(self, origin: usize, attempt: usize, slots: usize) -> usize {
        let s = slots as u128;
        let origin = origin as u128;
        let t = attempt as u128 % s;

        let slot = match self {
            ProbePolicy::Linear => origin + t,
            ProbePolicy::Quadratic => origin + t + t * t,
        };
        (slot % s) as usize
    }

    /// Every slot the policy visits starting from `origin`, in order.
    pub fn sequence(self, origin: usize, slots: usize) -> impl Iterator<Item = usize> {
        (0..slots).map(move |attempt| self.offset(origin, attempt, slots))
    }
}
