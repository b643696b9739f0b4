use rand::prelude::SliceRandom;
use rand::Rng;

/// Characters usable in the random part of a generated name.
pub static SUFFIX_CHARS: &[char] = &[
    'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's',
    't', 'u', 'v', 'w', 'x', 'y', 'z', '0', '1', '2', '3', '4', '5', '6', '7', '8', '9',
];

/// Length of the random part of a generated name.
pub static SUFFIX_LEN: usize = 8;

/// Maximum length of a DNS label, and so of a pod name.
pub static MAX_LABEL_LEN: usize = 63;

/// Generate the random part of a resource name.
pub fn random_suffix() -> String {
    random_suffix_with(&mut rand::thread_rng())
}

/// Like `random_suffix`, but with a caller-provided RNG.
pub fn random_suffix_with<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..SUFFIX_LEN)
        .map(|_| *SUFFIX_CHARS.choose(rng).unwrap_or(&'x'))
        .collect()
}

/// Build a resource name of the form `{prefix}-{context}-{suffix}`.
///
/// The context (a node or alert name) is squashed into DNS label characters
/// and truncated so that the whole name is a valid DNS label.  The prefix and
/// suffix are used as-is, and must themselves be lowercase DNS label
/// fragments.
pub fn resource_name(prefix: &str, context: &str, suffix: &str) -> String {
    let budget = MAX_LABEL_LEN.saturating_sub(prefix.len() + suffix.len() + 2);
    let squashed = squash_label(context);
    let context = squashed[..squashed.len().min(budget)].trim_matches('-');

    if context.is_empty() {
        format!("{prefix}-{suffix}")
    } else {
        format!("{prefix}-{context}-{suffix}")
    }
}

/// Lowercase a string and replace everything which isn't a DNS label
/// character with `-`.
fn squash_label(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect()
}

/// Make a string into a valid label value: at most 63 characters from
/// `[A-Za-z0-9-_.]`, beginning and ending with an alphanumeric.  Other
/// characters are replaced with `-`.
pub fn label_value(s: &str) -> String {
    let replaced: String = s
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '-'
            }
        })
        .take(MAX_LABEL_LEN)
        .collect();

    replaced
        .trim_matches(|c: char| !c.is_ascii_alphanumeric())
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn is_valid_dns_label(s: &str) -> bool {
        let valid_character = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-';

        !s.is_empty()
            && s.len() <= MAX_LABEL_LEN
            && s.chars().all(valid_character)
            && s.starts_with(|c: char| c.is_ascii_alphabetic())
            && !s.ends_with(|c: char| c == '-')
    }

    fn is_valid_label_value(s: &str) -> bool {
        let valid_character = |c: char| c.is_ascii_alphanumeric() || "-_.".contains(c);

        s.is_empty()
            || (s.len() <= MAX_LABEL_LEN
                && s.chars().all(valid_character)
                && s.starts_with(|c: char| c.is_ascii_alphanumeric())
                && s.ends_with(|c: char| c.is_ascii_alphanumeric()))
    }

    #[test]
    fn random_suffix_is_label_safe() {
        for _ in 0..100 {
            let suffix = random_suffix();
            assert_eq!(SUFFIX_LEN, suffix.len());
            assert!(suffix.chars().all(|c| SUFFIX_CHARS.contains(&c)));
        }
    }

    #[test]
    fn resource_name_shape() {
        assert_eq!(
            "nodeshell-node-7-abcd1234",
            resource_name("nodeshell", "node-7", "abcd1234")
        );
        assert_eq!(
            "silence-highcpu-abcd1234",
            resource_name("silence", "HighCPU", "abcd1234")
        );
        assert_eq!(
            "nodeshell-ip-10-0-0-1-ec2-internal-abcd1234",
            resource_name("nodeshell", "ip-10-0-0-1.ec2.internal", "abcd1234")
        );
    }

    #[test]
    fn resource_name_is_always_a_dns_label() {
        let contexts = [
            "node-7",
            "HighCPU",
            "KubePodCrashLooping",
            "a.very.long.node.name.that.goes.on.and.on.in.some.cloud.provider.internal",
            "___",
            "",
            "trailing-",
        ];
        for context in contexts {
            let name = resource_name("nodeshell", context, &random_suffix());
            assert!(is_valid_dns_label(&name), "{name} is not a DNS label");
        }
    }

    #[test]
    fn names_for_the_same_target_do_not_collide() {
        let count = 10_000;
        let names: HashSet<String> = (0..count)
            .map(|_| resource_name("nodeshell", "node-7", &random_suffix()))
            .collect();
        assert_eq!(count, names.len());
    }

    #[test]
    fn dns_labels() {
        assert!(is_valid_dns_label("kube-system"));
        assert!(is_valid_dns_label("a"));
        assert!(!is_valid_dns_label(""));
        assert!(!is_valid_dns_label("Kube-System"));
        assert!(!is_valid_dns_label("1abc"));
        assert!(!is_valid_dns_label("abc-"));
        assert!(!is_valid_dns_label("a.b"));
        assert!(!is_valid_dns_label(&"a".repeat(64)));
    }

    #[test]
    fn label_values_are_trimmed_to_alphanumerics() {
        let testcases = vec![
            ("HighCPU", "HighCPU"),
            ("HighCPU!", "HighCPU"),
            ("_Watchdog", "Watchdog"),
            ("High CPU ", "High-CPU"),
            ("node 7/a", "node-7-a"),
            ("ip-10-0-0-1.ec2.internal", "ip-10-0-0-1.ec2.internal"),
            ("!!!", ""),
            ("", ""),
        ];

        for (input, expected) in testcases {
            let value = label_value(input);
            assert_eq!(expected, value, "{input}");
            assert!(is_valid_label_value(&value), "{input} -> {value}");
        }
    }

    #[test]
    fn truncated_label_values_stay_valid() {
        let long = format!("{}.{}", "a".repeat(62), "b".repeat(10));
        let value = label_value(&long);

        assert_eq!("a".repeat(62), value);
        assert!(is_valid_label_value(&value));

        for input in [
            "x".repeat(100),
            format!("{}_-_", "y".repeat(61)),
            format!("-{}", "z".repeat(70)),
        ] {
            let value = label_value(&input);
            assert!(value.len() <= MAX_LABEL_LEN, "{input}");
            assert!(is_valid_label_value(&value), "{input} -> {value}");
        }
    }
}
