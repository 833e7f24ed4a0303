//! Validate a set of policy options

use crate::display;
use crate::options::PolicyOptions;

pub fn check_policy(options: &PolicyOptions) -> anyhow::Result<()> {
    display::banner("Policy Check");
    match options.validate() {
        Ok(policy) => {
            display::confirmed("Policy options are valid");
            display::field("Label", &policy.label);
            display::field("Threshold", &format!("{} of {}", policy.m, policy.n));
            display::field("Encrypting key", &format!("{} bytes", policy.policy_encrypting_key.len()));
            if let Some(kit) = &policy.message_kit {
                display::field("Message kit", &format!("{} chars", kit.len()));
            }
            Ok(())
        }
        Err(e) => {
            display::caution(&e.to_string());
            Err(e.into())
        }
    }
}
