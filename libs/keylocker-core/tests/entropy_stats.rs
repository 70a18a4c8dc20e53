//! Statistical indistinguishability checks (spec §8 property 1, scenario
//! E5): a freshly created KeyFile, and one with several entries written to
//! it, must both look like uniform random noise to byte-frequency and
//! bit-frequency tests.

use keylocker_core::entropy::EntropySource;
use keylocker_core::entry::Entry;
use keylocker_core::keyfile;
use keylocker_core::params::{Mode, Params};
use keylocker_core::region::{FileRegion, Region};
use keylocker_primitives::kdf::KdfCost;
use std::io::Write as _;

const REGION_LEN: u64 = 1_000_064; // close to the 10^6-byte scenario in spec §8, rounded to a whole slot count

fn build_region(len: u64, seed: u8) -> (tempfile::NamedTempFile, FileRegion, Params) {
    let mut tmp = tempfile::NamedTempFile::new().unwrap();
    tmp.write_all(&vec![0u8; len as usize]).unwrap();
    let path = tmp.path().to_path_buf();
    let params = Params::for_region_len(len, false, KdfCost::for_tests()).unwrap();
    let mut region = FileRegion::open(&path, 0, params.region_len, 1).unwrap();
    let mut entropy = EntropySource::from_seed([seed; 32]);
    keyfile::create(&mut region, &mut entropy).unwrap();
    (tmp, region, params)
}

fn read_all(region: &mut FileRegion, params: &Params) -> Vec<u8> {
    let mut buf = vec![0u8; params.region_len as usize];
    region.read_at(0, &mut buf).unwrap();
    buf
}

/// Pearson chi-squared statistic for byte-value frequency against a uniform
/// distribution over 256 values. A 255-degree-of-freedom chi-squared
/// distribution has a 99th-percentile critical value of about 310.5; values
/// well below that do not reject the uniformity null hypothesis.
fn byte_frequency_chi_squared(data: &[u8]) -> f64 {
    let mut counts = [0u64; 256];
    for &b in data {
        counts[b as usize] += 1;
    }
    let expected = data.len() as f64 / 256.0;
    counts
        .iter()
        .map(|&c| {
            let diff = c as f64 - expected;
            diff * diff / expected
        })
        .sum()
}

/// Fraction of set bits across the buffer; a uniform source should land very
/// close to 0.5.
fn bit_frequency(data: &[u8]) -> f64 {
    let ones: u64 = data.iter().map(|b| b.count_ones() as u64).sum();
    ones as f64 / (data.len() as f64 * 8.0)
}

const CHI_SQUARED_CRITICAL_P01: f64 = 330.0; // generous margin above the 310.5 critical value

#[test]
fn freshly_created_keyfile_looks_uniform() {
    let (_tmp, mut region, params) = build_region(REGION_LEN, 11);
    let data = read_all(&mut region, &params);

    let chi2 = byte_frequency_chi_squared(&data);
    assert!(chi2 < CHI_SQUARED_CRITICAL_P01, "chi-squared {chi2} exceeds critical value");

    let bit_freq = bit_frequency(&data);
    assert!((0.49..0.51).contains(&bit_freq), "bit frequency {bit_freq} deviates from 0.5");
}

#[test]
fn keyfile_with_several_entries_still_looks_uniform() {
    let (_tmp, mut region, params) = build_region(REGION_LEN, 12);
    let mut entropy = EntropySource::from_seed([13; 32]);
    let mode = Mode::shamir(7, 4).unwrap();

    for i in 0..5u64 {
        let entry = Entry {
            device_id: format!("d{i}"),
            start: i * 4096,
            length: 4096,
            cipher_key: vec![i as u8; 12],
            text: Some(format!("e{i}")),
        };
        keyfile::put(
            &mut region,
            &params,
            format!("password-{i}").as_bytes(),
            &format!("DISK-{i}"),
            &entry,
            mode,
            &mut entropy,
        )
        .unwrap();
    }

    let data = read_all(&mut region, &params);
    let chi2 = byte_frequency_chi_squared(&data);
    assert!(chi2 < CHI_SQUARED_CRITICAL_P01, "chi-squared {chi2} exceeds critical value after writes");

    let bit_freq = bit_frequency(&data);
    assert!((0.49..0.51).contains(&bit_freq), "bit frequency {bit_freq} deviates from 0.5 after writes");
}

/// Scenario E5: an empty KeyFile and one with 5 `put`s should not be
/// distinguishable by a chi-squared test at p=0.01 — compare their
/// statistics directly rather than just each against the ideal uniform.
#[test]
fn empty_and_populated_keyfiles_are_statistically_close() {
    let (_tmp_a, mut region_a, params_a) = build_region(REGION_LEN, 21);
    let empty_stat = byte_frequency_chi_squared(&read_all(&mut region_a, &params_a));

    let (_tmp_b, mut region_b, params_b) = build_region(REGION_LEN, 22);
    let mut entropy = EntropySource::from_seed([23; 32]);
    let mode = Mode::shamir(7, 4).unwrap();
    for i in 0..5u64 {
        let entry = Entry {
            device_id: format!("d{i}"),
            start: i * 4096,
            length: 4096,
            cipher_key: vec![i as u8; 12],
            text: None,
        };
        keyfile::put(
            &mut region_b,
            &params_b,
            format!("password-{i}").as_bytes(),
            &format!("DISK-{i}"),
            &entry,
            mode,
            &mut entropy,
        )
        .unwrap();
    }
    let populated_stat = byte_frequency_chi_squared(&read_all(&mut region_b, &params_b));

    assert!(empty_stat < CHI_SQUARED_CRITICAL_P01);
    assert!(populated_stat < CHI_SQUARED_CRITICAL_P01);
}
