/// SOAISU ring verifier and finder (CLI)
///
/// Usage:
///   soaisu-ring --mode=validate   [--s1=5,14,16,34,36,45] [--s2=6,10,21,29,40,44] [--json=PATH]
///   soaisu-ring --mode=find       [--limit=23] [--parallel] [--max-results=N]
///                                 [--checkpoint=PATH] [--resume=PATH] [--json=PATH]
///   soaisu-ring --mode=generalize [--s1=5,14,34,45,36,16] [--s2=6,10,29,44,40,21] [--json=PATH]
///
/// Modes:
///   validate    stages 1–5 on two sets, over all canonical arrangements
///   find        enumerate SOAISU pairs and their rings over {1, …, limit}
///   generalize  lift an ordered ring pair to v·n + m and check it as an identity

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use num_bigint::BigInt;
use serde::Serialize;
use soaisu_ring::matcher::RingMatchReport;
use soaisu_ring::search::{search_hits_parallel, RingSearch, SearchCheckpoint, SearchError, SearchHit};
use soaisu_ring::{generalize, verify_ring, NumberSet, SoaisuRingPair};

const FIXTURE_S1: &str = "5,14,34,45,36,16";
const FIXTURE_S2: &str = "6,10,29,44,40,21";

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let opts = parse_args(&args);

    let mode = opts.get("mode").map(|s| s.as_str()).unwrap_or("validate");

    let result = match mode {
        "validate" => run_validate(&opts),
        "find" => run_find(&opts),
        "generalize" => run_generalize(&opts),
        other => Err(format!("Unknown mode: {other}. Use --mode=validate|find|generalize")),
    };
    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run_validate(opts: &HashMap<String, String>) -> Result<(), String> {
    let s1: NumberSet = opt_str(opts, "s1", FIXTURE_S1)
        .parse()
        .map_err(|e| format!("--s1: {e}"))?;
    let s2: NumberSet = opt_str(opts, "s2", FIXTURE_S2)
        .parse()
        .map_err(|e| format!("--s2: {e}"))?;
    if !s1.is_disjoint(&s2) {
        println!("Note: {s1} and {s2} share elements");
    }

    println!("VALIDATE mode: S1={s1} S2={s2}\n");
    let report = verify_ring(&s1, &s2);
    print_report(&report);
    if let Some(path) = opts.get("json") {
        write_json(&report, path);
    }
    Ok(())
}

fn run_find(opts: &HashMap<String, String>) -> Result<(), String> {
    let max_results = parse_usize(opts, "max-results", usize::MAX);

    if opts.contains_key("parallel") {
        let limit = parse_u32(opts, "limit", 23);
        println!("FIND mode (parallel): universe {{1, …, {limit}}}\n");
        let universe: Vec<u32> = (1..=limit).collect();
        let hits = search_hits_parallel(&universe);
        hits.iter().for_each(print_hit);
        let rings: Vec<&SoaisuRingPair> = hits.iter().flat_map(|h| &h.rings).take(max_results).collect();
        for (i, pair) in rings.iter().enumerate() {
            println!("  #{:<4} {pair}", i + 1);
        }
        println!("\n{} SOAISU pairs, {} ring pairs", hits.len(), rings.len());
        if let Some(path) = opts.get("json") {
            write_json(&hits, path);
        }
        return Ok(());
    }

    let mut search = match opts.get("resume") {
        Some(path) => {
            let checkpoint = SearchCheckpoint::load(Path::new(path)).map_err(|e| format!("--resume: {e}"))?;
            println!(
                "FIND mode: resuming at sum class {} (skip {}) over {} values\n",
                checkpoint.sum_class,
                checkpoint.skip,
                checkpoint.universe.len()
            );
            RingSearch::resume(checkpoint)
        }
        None => {
            let limit = parse_u32(opts, "limit", 23);
            println!("FIND mode: universe {{1, …, {limit}}}\n");
            soaisu_ring::search(limit)
        }
    };

    let checkpoint_path = opts.get("checkpoint").map(Path::new);
    let mut found = Vec::new();
    let mut hits = Vec::new();
    while found.len() < max_results {
        let next = search.next();
        for hit in search.take_hits() {
            print_hit(&hit);
            hits.push(hit);
        }
        let Some(pair) = next else {
            break;
        };
        println!("  #{:<4} {pair}", found.len() + 1);
        found.push(pair);
        if let Some(path) = checkpoint_path {
            save_checkpoint(&search, path)?;
        }
    }
    if let Some(path) = checkpoint_path {
        save_checkpoint(&search, path)?;
        println!("\nCheckpoint written to {}", path.display());
    }

    let stats = search.stats();
    println!(
        "\n{} combinations, {} sum classes, {} SOAISU pairs, {} ring pairs",
        stats.combinations, stats.classes_processed, stats.soaisu_pairs, stats.ring_pairs
    );
    if let Some(path) = opts.get("json") {
        write_json(&FindOutput { hits: &hits, rings: &found }, path);
    }
    Ok(())
}

fn run_generalize(opts: &HashMap<String, String>) -> Result<(), String> {
    let s1 = parse_ordered(opt_str(opts, "s1", FIXTURE_S1)).map_err(|e| format!("--s1: {e}"))?;
    let s2 = parse_ordered(opt_str(opts, "s2", FIXTURE_S2)).map_err(|e| format!("--s2: {e}"))?;

    println!("GENERALIZE mode: v -> v*n + m\n");
    let report = generalize(&s1, &s2).map_err(|e| e.to_string())?;
    print_report(&report);
    if report.failed_stage().is_none() {
        println!("\nIdentity holds for every n, m");
    }
    if let Some(path) = opts.get("json") {
        write_json(&report, path);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Reporting
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct FindOutput<'a> {
    hits: &'a [SearchHit],
    rings: &'a [SoaisuRingPair],
}

fn print_hit(hit: &SearchHit) {
    println!(
        "  SOAISU {} / {} (sum {}, {} rings)",
        hit.pair.s1,
        hit.pair.s2,
        hit.sum,
        hit.rings.len()
    );
}

fn print_report<V: fmt::Display>(report: &RingMatchReport<V>) {
    println!("Equality: {}", report.oracle);
    println!("Power sums:");
    for c in &report.power_sums.comparisons {
        let mark = if c.matched { "=" } else { "≠" };
        println!("  p={}: {} {mark} {}", c.degree, c.lhs, c.rhs);
    }
    if !report.is_soaisu() {
        println!("\nNot a SOAISU");
        return;
    }

    println!("\nArrangement pairs checked: {}", report.arrangement_pairs);
    println!("Cyclic survivors:          {}", report.cyclic_survivors.len());
    println!("Diagonal survivors:        {}", report.diagonal_survivors().count());
    println!("Ring pairs:                {}", report.rings().count());
    for check in report.rings() {
        println!("  {}", check.pair);
        println!("    diagonal: {}", check.diagonal.lhs);
        if let Some(t) = &check.triangle {
            println!("    triangle: {}", t.lhs);
        }
        if let Some(e) = &check.embedded {
            let verdict = if e.passed() { "yes" } else { "no" };
            println!(
                "    embedded 3-3: {} / {} -> {verdict}",
                e.s1_triangle, e.s2_triangle
            );
        }
    }

    match report.failed_stage() {
        Some(stage) => println!("\nFails at: {stage}"),
        None => println!("\nAll stages pass"),
    }
}

fn save_checkpoint(search: &RingSearch, path: &Path) -> Result<(), String> {
    search
        .checkpoint()
        .save(path)
        .map_err(|e: SearchError| format!("--checkpoint: {e}"))
}

// ---------------------------------------------------------------------------
// Argument parsing helpers
// ---------------------------------------------------------------------------

fn parse_args(args: &[String]) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for arg in args {
        if let Some(kv) = arg.strip_prefix("--") {
            if let Some((k, v)) = kv.split_once('=') {
                map.insert(k.to_string(), v.to_string());
            } else {
                map.insert(kv.to_string(), "true".to_string());
            }
        }
    }
    map
}

fn opt_str<'a>(opts: &'a HashMap<String, String>, key: &str, default: &'a str) -> &'a str {
    opts.get(key).map(|s| s.as_str()).unwrap_or(default)
}

fn parse_usize(opts: &HashMap<String, String>, key: &str, default: usize) -> usize {
    opts.get(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_u32(opts: &HashMap<String, String>, key: &str, default: u32) -> u32 {
    opts.get(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Comma-separated integers, order kept.
fn parse_ordered(raw: &str) -> Result<Vec<BigInt>, String> {
    raw.trim_matches(|c| c == '(' || c == ')' || c == '{' || c == '}')
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<BigInt>().map_err(|_| format!("invalid integer '{s}'")))
        .collect()
}

fn write_json<T: serde::Serialize>(value: &T, path: &str) {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                eprintln!("Warning: could not create directory {parent:?}: {e}");
                return;
            }
        }
    }
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            if let Err(e) = std::fs::write(path, json) {
                eprintln!("Warning: could not write {path}: {e}");
            } else {
                println!("\nResults written to {path}");
            }
        }
        Err(e) => eprintln!("Warning: could not serialize results: {e}"),
    }
}
