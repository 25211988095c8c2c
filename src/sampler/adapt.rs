//! Warm-up step size adaptation by dual averaging (Nesterov 2009, Stan variant).
//!
//! The adapter drives `log ε` so that the running mean of the Metropolis acceptance
//! probability approaches a target. During warm-up the chain uses
//! [`DualAveraging::current_step_size`]; once warm-up ends the smoothed
//! [`DualAveraging::adapted_step_size`] is frozen for the sampling phase.

/// Dual averaging state for a single chain.
#[derive(Debug, Clone)]
pub struct DualAveraging {
    target_accept: f64,
    log_eps: f64,
    log_eps_bar: f64,
    h_bar: f64,
    mu: f64,
    gamma: f64,
    t0: f64,
    kappa: f64,
    step: usize,
}

impl DualAveraging {
    /// Create with a target acceptance rate and initial step size.
    pub fn new(target_accept: f64, init_eps: f64) -> Self {
        let log_eps0 = init_eps.ln();
        Self {
            target_accept,
            log_eps: log_eps0,
            log_eps_bar: log_eps0,
            h_bar: 0.0,
            // Shrink towards the initial step; proposals arrive pre-scaled.
            mu: log_eps0,
            gamma: 0.05,
            t0: 10.0,
            kappa: 0.75,
            step: 0,
        }
    }

    /// Update with the acceptance probability of one transition.
    pub fn update(&mut self, accept_prob: f64) {
        self.step += 1;
        let m = self.step as f64;
        let w = 1.0 / (m + self.t0);
        self.h_bar = (1.0 - w) * self.h_bar + w * (self.target_accept - accept_prob);

        self.log_eps = self.mu - (m.sqrt() / self.gamma) * self.h_bar;
        let m_kappa = m.powf(-self.kappa);
        self.log_eps_bar = m_kappa * self.log_eps + (1.0 - m_kappa) * self.log_eps_bar;
    }

    /// Step size to use for the next warm-up transition.
    pub fn current_step_size(&self) -> f64 {
        self.log_eps.exp()
    }

    /// Smoothed step size to freeze after warm-up.
    pub fn adapted_step_size(&self) -> f64 {
        self.log_eps_bar.exp()
    }

    /// Number of updates seen.
    pub fn steps(&self) -> usize {
        self.step
    }
}
