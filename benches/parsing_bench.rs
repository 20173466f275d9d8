use criterion::{Criterion, black_box, criterion_group, criterion_main};

use rlibphonevalidator::{PHONE_NUMBER_UTIL, PhoneNumberType, ValidationOptions, validate};

use phonenumber::{self as rlp, country::Id};

// (input, region for this crate, region for rust-phonenumber)
type TestEntity = (&'static str, &'static str, Id);

fn setup_parsing_data() -> Vec<TestEntity> {
    use phonenumber::country::Id::*;
    vec![
        // International prefix of a region with several IDDs
        ("0011 44 1234 567890 ext. 1234", "AU", AU),
        // National US format with punctuation
        ("(201) 555-0123", "US", US),
        // International format with a plus sign
        ("+44 1234 567890", "GB", GB),
        // National prefix to strip
        ("01234 567890", "GB", GB),
        // Leading zero that belongs to the number
        ("02 1234 5678", "IT", IT),
        // Vanity number
        ("1-800-FLOWERS", "US", US),
        ("078 123 45 67", "CH", CH),
        ("01 23 45 67 89", "FR", FR),
    ]
}

fn parsing_benchmark(c: &mut Criterion) {
    let numbers_to_parse = setup_parsing_data();

    let mut group = c.benchmark_group("Parsing Comparison");

    group.bench_function("rlibphonevalidator: parse()", |b| {
        b.iter(|| {
            for (number_str, region, _) in &numbers_to_parse {
                let _ = PHONE_NUMBER_UTIL.parse(black_box(number_str), black_box(Some(*region)));
            }
        })
    });

    group.bench_function("rust-phonenumber: parse()", |b| {
        b.iter(|| {
            for (number_str, _, region_id) in &numbers_to_parse {
                let _ = rlp::parse(black_box(Some(*region_id)), black_box(number_str));
            }
        })
    });

    group.finish();
}

fn validation_benchmark(c: &mut Criterion) {
    // RUST_LOG=debug shows the outcome of every validation
    let _ = env_logger::try_init();
    let numbers_to_validate = setup_parsing_data();
    let options = numbers_to_validate
        .iter()
        .map(|(_, region, _)| {
            ValidationOptions::new()
                .with_default_region(*region)
                .with_number_type(PhoneNumberType::FixedLine)
        })
        .collect::<Vec<_>>();

    c.bench_function("rlibphonevalidator: validate()", |b| {
        b.iter(|| {
            for ((number_str, _, _), options) in numbers_to_validate.iter().zip(&options) {
                let _ = validate(black_box(*number_str), black_box(options));
            }
        })
    });
}

criterion_group!(benches, parsing_benchmark, validation_benchmark);
criterion_main!(benches);
