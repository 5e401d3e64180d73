use std::{
    collections::{HashMap, HashSet},
    num::NonZeroUsize,
};

use kconftool::{
    assignment::Assignment,
    cmd::split::split_assignments,
    error::Diagnostic,
    minimize::minimize,
    partition::{PartitionMode, partition},
    resolve::resolve,
};
use ktree::{
    ChoiceSpec, CompareOp, ConfigSpec, Expr, MenuSpec, Tree, TreeSnapshot, Value, ValueKind,
};
use proptest::prelude::*;

fn tree() -> Tree {
    TreeSnapshot::new("x86")
        .entry(ConfigSpec::new("SMP", ValueKind::Bool).default(Expr::y()))
        .entry(
            ConfigSpec::new("NR_CPUS", ValueKind::Int)
                .depends_on(Expr::sym("SMP"))
                .default_if(Expr::lit("64"), Expr::sym("SMP"))
                .default(Expr::lit("1")),
        )
        .entry(
            ConfigSpec::new("BIG_SYSTEM", ValueKind::Bool).default(Expr::compare(
                CompareOp::Gt,
                Expr::sym("NR_CPUS"),
                Expr::lit("8"),
            )),
        )
        .entry(ConfigSpec::new("LOCALVERSION", ValueKind::String))
        .entry(ConfigSpec::new("NET", ValueKind::Bool).default(Expr::y()))
        .entry(
            MenuSpec::new("net")
                .depends_on(Expr::sym("NET"))
                .entry(ConfigSpec::new("INET", ValueKind::Bool).default(Expr::y()))
                .entry(
                    MenuSpec::new("netfilter")
                        .depends_on(Expr::sym("INET"))
                        .entry(ConfigSpec::new("NETFILTER", ValueKind::Bool))
                        .entry(
                            ConfigSpec::new("NF_CONNTRACK", ValueKind::Tristate)
                                .depends_on(Expr::sym("NETFILTER"))
                                .default(Expr::m()),
                        )
                        .entry(
                            ConfigSpec::new("NF_NAT", ValueKind::Tristate)
                                .depends_on(Expr::sym("NF_CONNTRACK")),
                        ),
                ),
        )
        .entry(
            MenuSpec::new("fs")
                .entry(ConfigSpec::new("EXT4_FS", ValueKind::Tristate).default(Expr::y()))
                .entry(ConfigSpec::new("EXT4_DEBUG", ValueKind::Bool).depends_on(Expr::sym("EXT4_FS")))
                .entry(ConfigSpec::new("BTRFS_FS", ValueKind::Tristate)),
        )
        .entry(
            MenuSpec::new("kernel")
                .entry(
                    ChoiceSpec::new()
                        .name("HZ")
                        .default("HZ_250")
                        .member(ConfigSpec::new("HZ_100", ValueKind::Bool))
                        .member(ConfigSpec::new("HZ_250", ValueKind::Bool))
                        .member(ConfigSpec::new("HZ_1000", ValueKind::Bool).depends_on(Expr::sym("SMP"))),
                )
                .entry(
                    ChoiceSpec::new()
                        .name("PREEMPT")
                        .depends_on(Expr::sym("SMP"))
                        .member(ConfigSpec::new("PREEMPT_NONE", ValueKind::Bool))
                        .member(ConfigSpec::new("PREEMPT_VOLUNTARY", ValueKind::Bool)),
                ),
        )
        .entry(
            MenuSpec::new("drivers")
                .entry(ConfigSpec::new("PHYS_START", ValueKind::Hex).default(Expr::lit("0x1000000")))
                .entry(
                    MenuSpec::new("usb")
                        .entry(ConfigSpec::new("USB_SUPPORT", ValueKind::Bool).default(Expr::y()))
                        .entry(ConfigSpec::new("USB", ValueKind::Tristate).depends_on(Expr::sym("USB_SUPPORT"))),
                )
                .entry(
                    MenuSpec::new("gpu")
                        .entry(ConfigSpec::new("DRM", ValueKind::Tristate))
                        .entry(ConfigSpec::new("DRM_DEBUG", ValueKind::Bool).depends_on(Expr::sym("DRM"))),
                ),
        )
        .build()
        .unwrap()
}

const NAMES: &[&str] = &[
    "SMP",
    "NR_CPUS",
    "BIG_SYSTEM",
    "LOCALVERSION",
    "NET",
    "INET",
    "NETFILTER",
    "NF_CONNTRACK",
    "NF_NAT",
    "EXT4_FS",
    "EXT4_DEBUG",
    "BTRFS_FS",
    "HZ_100",
    "HZ_250",
    "HZ_1000",
    "PREEMPT_NONE",
    "PREEMPT_VOLUNTARY",
    "PHYS_START",
    "USB_SUPPORT",
    "USB",
    "DRM",
    "DRM_DEBUG",
    "STALE_SYMBOL",
];

const SECTIONS: &[&str] = &["net", "net/netfilter", "fs", "kernel", "drivers", "drivers/usb"];

fn value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Y),
        Just(Value::M),
        Just(Value::N),
        (0u32..300).prop_map(|n| Value::string(n.to_string())),
        (0u32..0x2000).prop_map(|n| Value::string(format!("0x{n:x}"))),
        "[a-z-]{0,6}".prop_map(Value::String),
    ]
}

fn assignments() -> impl Strategy<Value = Vec<Assignment>> {
    prop::collection::vec(
        (0..NAMES.len(), value()).prop_map(|(i, v)| Assignment::new(NAMES[i], v)),
        0..24,
    )
}

fn section_names() -> impl Strategy<Value = Vec<String>> {
    prop::sample::subsequence(SECTIONS, 0..=SECTIONS.len())
        .prop_map(|names| names.into_iter().map(String::from).collect())
}

fn partition_mode() -> impl Strategy<Value = PartitionMode> {
    prop_oneof![
        section_names().prop_map(PartitionMode::Sections),
        (1usize..5).prop_map(|n| PartitionMode::MaxSymbols(NonZeroUsize::new(n).unwrap())),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn minimal_config_reproduces_target(input in assignments()) {
        let tree = tree();
        let target = resolve(&tree, &input).unwrap().config;
        let minimal = minimize(&tree, &target);
        prop_assert!(minimal.skipped.is_empty());

        let replayed = resolve(&tree, &minimal.assignments).unwrap();
        prop_assert_eq!(&replayed.config, &target);
        prop_assert!(replayed.unresolved.is_empty());

        // declaration order
        let ids: Vec<_> = minimal.assignments.iter().map(|a| tree.lookup(&a.symbol)).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        prop_assert_eq!(ids, sorted);
    }

    #[test]
    fn at_most_one_choice_member_is_on(input in assignments()) {
        let tree = tree();
        let config = resolve(&tree, &input).unwrap().config;
        for group in tree.choice_groups() {
            let on = group
                .members
                .iter()
                .filter(|m| config.get(&tree.symbol(**m).name) == Some(&Value::Y))
                .count();
            prop_assert!(on <= 1, "choice {} has {} members on", group.label(), on);
        }
    }

    #[test]
    fn every_assigned_symbol_lands_in_one_fragment(input in assignments(), mode in partition_mode()) {
        let tree = tree();
        let part = partition(&tree, &input, &mode);

        let mut seen: HashMap<&str, usize> = HashMap::new();
        for fragment in &part.fragments {
            for assignment in &fragment.assignments {
                *seen.entry(assignment.symbol.as_str()).or_default() += 1;
            }
        }
        for assignment in &input {
            prop_assert_eq!(seen.get(assignment.symbol.as_str()), Some(&1));
        }
        let distinct: HashSet<&str> = input.iter().map(|a| a.symbol.as_str()).collect();
        prop_assert_eq!(seen.len(), distinct.len());
        prop_assert_eq!(part.fragments.iter().filter(|f| f.is_remainder()).count(), 1);
        prop_assert!(part.fragments.iter().all(|f| f.is_remainder() || !f.is_empty()));
        let file_names: HashSet<&str> = part.fragments.iter().map(|f| f.name.as_str()).collect();
        prop_assert_eq!(file_names.len(), part.fragments.len());
    }

    #[test]
    fn fragments_respect_bound_or_are_flagged(input in assignments(), bound in 1usize..5) {
        let tree = tree();
        let bound = NonZeroUsize::new(bound).unwrap();
        let part = partition(&tree, &input, &PartitionMode::MaxSymbols(bound));
        for fragment in &part.fragments {
            if fragment.len() > bound.get() {
                let flagged = part.diagnostics.iter().any(|d| matches!(
                    d,
                    Diagnostic::SizeBoundUnsatisfiable { fragment: label, .. } if *label == fragment.label
                ));
                prop_assert!(flagged, "fragment `{}` exceeds the bound unflagged", fragment.name);
            }
        }
    }

    #[test]
    fn split_fragments_merge_back(input in assignments(), mode in partition_mode()) {
        let tree = tree();
        let target = resolve(&tree, &input).unwrap().config;
        let part = split_assignments(&tree, &target.to_assignments(), &mode).unwrap();

        let merged: Vec<Assignment> = part
            .fragments
            .iter()
            .flat_map(|f| f.assignments.iter().cloned())
            .collect();
        prop_assert_eq!(resolve(&tree, &merged).unwrap().config, target);
    }
}
