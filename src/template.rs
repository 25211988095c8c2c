//! Textual description of the GLM the sampler targets.

use crate::regression::Family;
use std::sync::OnceLock;

static MODEL_TEMPLATE: OnceLock<String> = OnceLock::new();

/// The model description with `{{placeholders}}` for family-specific lines.
///
/// Loaded on first use and shared read-only for the rest of the process.
pub fn model_template() -> &'static str {
    MODEL_TEMPLATE.get_or_init(|| include_str!("templates/glm.txt").to_string())
}

/// The model description specialized to `family` with `n_coefficients` coefficients.
pub fn render_model(family: Family, n_coefficients: usize) -> String {
    let (likelihood, noise_parameter, noise_prior) = match family {
        Family::Gaussian => (
            "normal(X * beta, sigma)",
            "  real<lower=0> sigma;\n",
            "  sigma^2 ~ inv_gamma(a0, b0);\n",
        ),
        Family::Bernoulli => ("bernoulli_logit(X * beta)", "", ""),
    };
    model_template()
        .replace("{{n_coefficients}}", &n_coefficients.to_string())
        .replace("{{noise_parameter}}", noise_parameter)
        .replace("{{noise_prior}}", noise_prior)
        .replace("{{likelihood}}", likelihood)
        .replace("{{link}}", family.link())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_is_shared() {
        let a = model_template();
        let b = model_template();
        assert!(!a.is_empty());
        assert!(std::ptr::eq(a, b));
    }

    #[test]
    fn rendering_fills_every_placeholder() {
        let gaussian = render_model(Family::Gaussian, 3);
        assert!(!gaussian.contains("{{"));
        assert!(gaussian.contains("sigma"));
        assert!(gaussian.contains("// 3"));

        let logit = render_model(Family::Bernoulli, 2);
        assert!(!logit.contains("{{"));
        assert!(logit.contains("bernoulli_logit"));
        assert!(!logit.contains("sigma"));
    }
}
