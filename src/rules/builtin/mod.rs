//! Builtin rule catalogue.
//!
//! Each module contributes one rule via an explicit `rule()` call; the
//! composition root registers them into a `Registry` value. Check functions
//! are pure: they read the block and context, and add results.

pub mod open_firewall;
pub mod open_ingress;
pub mod plain_http;
pub mod public_s3_acl;
pub mod sensitive_variable_default;
pub mod unencrypted_managed_disk;
pub mod unencrypted_s3_bucket;

use super::Rule;

pub fn all_rules() -> Vec<Rule> {
    vec![
        public_s3_acl::rule(),
        plain_http::rule(),
        open_ingress::rule(),
        unencrypted_s3_bucket::rule(),
        unencrypted_managed_disk::rule(),
        open_firewall::rule(),
        sensitive_variable_default::rule(),
    ]
}

/// An attribute that opens a CIDR range to the whole internet, whether
/// written as a list or a bare string.
pub(crate) fn is_open_cidr(attr: &crate::model::Attribute) -> bool {
    for open in ["0.0.0.0/0", "::/0", "*"] {
        if attr.equals(open) || attr.contains(open) {
            return true;
        }
    }
    false
}
