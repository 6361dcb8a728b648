//! Element type inference for technology components.

use am_core::{ElementType, contains_word_run, normalize_name};

/// Ordered keyword rules; the first rule with a matching keyword wins.
///
/// Keywords shorter than four characters must match a whole word of the
/// normalized name (`db` matches "orders db" but not "dbadmin"); longer
/// keywords match anywhere in the lower-cased name.
pub const TECHNOLOGY_RULES: &[(ElementType, &[&str])] = &[
    (
        ElementType::SystemSoftware,
        &[
            "database",
            "db",
            "postgres",
            "postgresql",
            "mysql",
            "mariadb",
            "oracle",
            "sql server",
            "mongodb",
            "redis",
            "cassandra",
            "dynamodb",
            "elasticsearch",
        ],
    ),
    (
        ElementType::Device,
        &[
            "device",
            "sensor",
            "mobile",
            "tablet",
            "laptop",
            "workstation",
            "printer",
            "scanner",
            "kiosk",
            "handheld",
            "iot",
        ],
    ),
    (
        ElementType::CommunicationNetwork,
        &["network", "vpn", "lan", "wan", "subnet", "vpc"],
    ),
    (
        ElementType::Artifact,
        &["artifact", "package", "binary", "jar", "bundle"],
    ),
    (
        ElementType::SystemSoftware,
        &[
            "operating system",
            "linux",
            "windows",
            "kubernetes",
            "k8s",
            "docker",
            "runtime",
            "jvm",
            "middleware",
            "kafka",
            "rabbitmq",
            "queue",
            "broker",
            "nginx",
            "tomcat",
        ],
    ),
    (
        ElementType::TechnologyService,
        &["hosting", "saas", "paas", "iaas", "managed service"],
    ),
    (
        ElementType::Node,
        &[
            "node",
            "server",
            "host",
            "vm",
            "virtual machine",
            "cluster",
            "instance",
            "compute",
            "container",
            "load balancer",
            "gateway",
            "cloud",
        ],
    ),
];

const SHORT_KEYWORD_LEN: usize = 4;

/// Infer the element type of a technology component from its name.
#[must_use]
pub fn infer_technology_type(name: &str) -> ElementType {
    let lowered = name.to_lowercase();
    let normalized = normalize_name(name);
    TECHNOLOGY_RULES
        .iter()
        .find(|(_, keywords)| {
            keywords
                .iter()
                .any(|keyword| keyword_matches(&lowered, &normalized, keyword))
        })
        .map_or(ElementType::Node, |(element_type, _)| *element_type)
}

fn keyword_matches(lowered: &str, normalized: &str, keyword: &str) -> bool {
    if keyword.chars().count() < SHORT_KEYWORD_LEN {
        contains_word_run(normalized, keyword)
    } else {
        lowered.contains(keyword)
    }
}
