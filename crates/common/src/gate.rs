/// Number of inputs the gate consumes: nine indicator values plus the
/// confidence score, in `IndicatorSnapshot::feature_vector` order.
pub const GATE_FEATURES: usize = 10;

/// Optional probability gate applied to approved signals before delivery.
///
/// The concrete predictor is chosen once at configuration time and injected;
/// there is no runtime fallback chain. `None` means the gate is unavailable
/// (no trained model), in which case signals pass through un-gated.
pub trait SignalGate: Send + Sync {
    fn predict(&self, features: &[f64; GATE_FEATURES]) -> Option<f64>;
}

/// Default gate: always unavailable.
pub struct DisabledGate;

impl SignalGate for DisabledGate {
    fn predict(&self, _features: &[f64; GATE_FEATURES]) -> Option<f64> {
        None
    }
}
