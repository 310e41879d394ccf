use std::panic;

use trace_core::{Match, Processor, find_pattern, replace_matches, validate_all};

const CASES: usize = 300;
const MAX_LEN: usize = 256;
// Bracket-heavy so random input actually forms patterns.
const CHARSET: &[u8] = b"ab [[[]]]]?m+<>/\n";
const TRIGGERS: &[(&str, usize)] = &[("[?]", 2), ("[m]", 2), ("[+]", 1), ("[", 1)];

#[test]
fn scanner_never_panics_on_random_input() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = Lcg::new(0x5eed_0f7a_ce00_1234);
    for case in 0..CASES {
        let len = rng.gen_range(0, MAX_LEN + 1);
        let source = random_string(&mut rng, len);
        for &(trigger, count) in TRIGGERS {
            let result = panic::catch_unwind(|| find_pattern(&source, trigger, count).len());
            if result.is_err() {
                return Err(format!(
                    "find_pattern({:?}) panicked for case {}: {:?}",
                    trigger, case, source
                )
                .into());
            }
        }
        if panic::catch_unwind(|| Processor::default().process(&source)).is_err() {
            return Err(format!("process panicked for case {}: {:?}", case, source).into());
        }
        if panic::catch_unwind(|| validate_all(&source, 10_000)).is_err() {
            return Err(format!("validate panicked for case {}: {:?}", case, source).into());
        }
    }
    Ok(())
}

#[test]
fn matches_respect_offsets_and_section_counts() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = Lcg::new(0x0dd5_eed5_a11c_e777);
    for case in 0..CASES {
        let len = rng.gen_range(0, MAX_LEN + 1);
        let source = random_string(&mut rng, len);
        for &(trigger, count) in TRIGGERS {
            let matches = find_pattern(&source, trigger, count);
            if let Err(message) = check_matches(&source, trigger, count, &matches) {
                return Err(format!(
                    "case {} trigger {:?}: {}\nSource:\n---\n{}\n---",
                    case, trigger, message, source
                )
                .into());
            }
        }
    }
    Ok(())
}

#[test]
fn replacing_with_full_match_is_identity() {
    let mut rng = Lcg::new(0xfeed_beef_0000_0042);
    for _ in 0..CASES {
        let len = rng.gen_range(0, MAX_LEN + 1);
        let source = random_string(&mut rng, len);
        for &(trigger, count) in TRIGGERS {
            let matches = find_pattern(&source, trigger, count);
            let out = replace_matches(&source, &matches, |m| m.full_match.to_string());
            assert_eq!(out, source, "identity failed for trigger {:?}", trigger);
        }
    }
}

#[test]
fn text_without_trigger_has_no_matches() {
    let mut rng = Lcg::new(0x1357_9bdf_2468_ace0);
    for _ in 0..CASES {
        let len = rng.gen_range(0, MAX_LEN + 1);
        let source = random_string(&mut rng, len);
        for &(trigger, count) in TRIGGERS {
            if !source.contains(trigger) {
                assert!(find_pattern(&source, trigger, count).is_empty());
            }
        }
        let plain = source.replace('[', "(");
        assert_eq!(Processor::default().process(&plain).html, plain);
    }
}

fn check_matches(
    source: &str,
    trigger: &str,
    count: usize,
    matches: &[Match<'_>],
) -> Result<(), String> {
    let mut prev_end = 0;
    for (idx, found) in matches.iter().enumerate() {
        if found.sections.len() != count {
            return Err(format!(
                "match {} has {} sections, expected {}",
                idx,
                found.sections.len(),
                count
            ));
        }
        if found.start_index < prev_end {
            return Err(format!(
                "match {} starts at {} before previous end {}",
                idx, found.start_index, prev_end
            ));
        }
        if source.get(found.start_index..found.end_index) != Some(found.full_match) {
            return Err(format!(
                "match {} full_match {:?} differs from source[{}..{}]",
                idx, found.full_match, found.start_index, found.end_index
            ));
        }
        if !found.full_match.starts_with(trigger) || !found.full_match.ends_with(']') {
            return Err(format!("match {} has unexpected shape {:?}", idx, found.full_match));
        }
        for section in &found.sections {
            let opens = section.matches('[').count();
            let closes = section.matches(']').count();
            if opens != closes {
                return Err(format!("match {} section {:?} is unbalanced", idx, section));
            }
        }
        prev_end = found.end_index;
    }
    Ok(())
}

fn random_string(rng: &mut Lcg, len: usize) -> String {
    let mut out = String::with_capacity(len);
    for _ in 0..len {
        let idx = rng.gen_range(0, CHARSET.len());
        let byte = CHARSET.get(idx).copied().unwrap_or(b' ');
        out.push(byte as char);
    }
    out
}

struct Lcg {
    state: u64,
}

impl Lcg {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next(&mut self) -> u64 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        self.state
    }

    fn gen_range(&mut self, min: usize, max: usize) -> usize {
        if max <= min {
            return min;
        }
        let span = max - min;
        let value = (self.next() >> 1) as usize;
        min + (value % span)
    }
}
