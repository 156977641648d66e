use super::clean::FieldCleaner;
use super::labels::{ADDRESS, FATHER};
use super::merge::{merge_strategies, script_density_score};
use super::normalize::normalize_text;
use super::segment::{Segmenter, detect_gender, prepare_text, record_key};
use super::*;
use crate::config::ExtractionConfig;
use crate::model::{Gender, VoterRecord};

fn extractor() -> RecordExtractor {
    RecordExtractor::new(ExtractionConfig::default()).expect("extractor should build")
}

fn record(serial_no: u32, name: &str) -> VoterRecord {
    VoterRecord {
        serial_no,
        cr: serial_no.to_string(),
        name: name.to_string(),
        ..VoterRecord::default()
    }
}

const FULL_RECORD: &str = "\
০১. নাম: মোঃ আব্দুল করিম
ভোটার নং: ১২৩৪৫৬৭৮৯০১২
পিতা: মোঃ আব্দুর রহিম
মাতা: রোকেয়া বেগম
পেশা: কৃষক, জন্ম তারিখ: ০১/০২/১৯৮০
ঠিকানা: গ্রাম হরিপুর, ডাকঘর সদর
";

#[test]
fn normalize_text_maps_digits_and_danda_only() {
    let input = "০১২৩৪৫৬৭৮৯। নাম abc";
    let normalized = normalize_text(input);

    assert_eq!(normalized, "0123456789. নাম abc");
    assert_eq!(normalized.chars().count(), input.chars().count());
}

#[test]
fn normalize_text_is_idempotent() {
    for input in ["১২/০৩/১৯৯০", "পিতা: রহিম।", "plain ascii 42", ""] {
        let once = normalize_text(input);
        assert_eq!(normalize_text(&once), once);
    }
}

#[test]
fn segmenter_splits_on_serial_and_name_label() {
    let segmenter = Segmenter::new().expect("segmenter should build");
    let text = "1.নাম: রহিম\n2.নাম: করিম";

    let chunks = segmenter.chunks(text);
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].anchor.serial_raw, "1");
    assert_eq!(chunks[0].text, "1.নাম: রহিম\n");
    assert_eq!(chunks[1].anchor.text_offset, text.find("2.").unwrap_or_default());

    let extraction = extractor().extract_page(text, Gender::Unknown);
    let names = extraction
        .records
        .iter()
        .map(|record| record.name.as_str())
        .collect::<Vec<&str>>();
    assert_eq!(names, vec!["রহিম", "করিম"]);
}

#[test]
fn segmenter_accepts_ocr_variant_of_name_label() {
    let segmenter = Segmenter::new().expect("segmenter should build");
    let anchors = segmenter.anchors("12) নাষ; সালমা খাতুন\nপিতা: রহিম");

    assert_eq!(anchors.len(), 1);
    assert_eq!(anchors[0].serial_raw, "12");
    assert_eq!(anchors[0].name_raw, "সালমা খাতুন");
}

#[test]
fn text_without_anchors_yields_no_records() {
    let extraction = extractor().extract_page("ভোটার তালিকা\nকোনো রেকর্ড নেই", Gender::Unknown);
    assert!(extraction.records.is_empty());
}

#[test]
fn extract_page_populates_every_labelled_field() {
    let extraction = extractor().extract_page(FULL_RECORD, Gender::Unknown);
    assert_eq!(extraction.records.len(), 1);

    let record = &extraction.records[0];
    assert_eq!(record.serial_no, 1);
    assert_eq!(record.cr, "1");
    assert_eq!(record.name, "মোঃ আব্দুল করিম");
    assert_eq!(record.voter_no, "123456789012");
    assert_eq!(record.father_name, "মোঃ আব্দুর রহিম");
    assert_eq!(record.mother_name, "রোকেয়া বেগম");
    assert_eq!(record.occupation, "কৃষক");
    assert_eq!(record.date_of_birth, "01/02/1980");
    assert_eq!(record.address, "গ্রাম হরিপুর, ডাকঘর সদর");
    assert_eq!(record.nid, "");
    assert_eq!(record.gender, Gender::Unknown);
}

#[test]
fn occupation_and_birth_date_fall_back_to_separate_rules() {
    let text = "3. নাম: করিম মিয়া\nপেশা: ছাত্র\nতারিখ: ০৫-০৬-২০০১\n";
    let extraction = extractor().extract_page(text, Gender::Unknown);

    let record = &extraction.records[0];
    assert_eq!(record.occupation, "ছাত্র");
    assert_eq!(record.date_of_birth, "05-06-2001");
}

#[test]
fn national_id_label_variants_are_recognized() {
    let text = "4. নাম: সালমা খাতুন\nNID: ১৯৯০১২৩৪৫৬৭\n";
    let extraction = extractor().extract_page(text, Gender::Unknown);

    assert_eq!(extraction.records[0].nid, "19901234567");
}

#[test]
fn names_with_fewer_than_two_script_chars_are_dropped() {
    let text = "1. নাম: ab\n2. নাম: ক\n3. নাম: রহিম";
    let extraction = extractor().extract_page(text, Gender::Unknown);

    assert_eq!(extraction.records.len(), 1);
    assert_eq!(extraction.records[0].cr, "3");

    let merged = extractor().merge_page(text, text, Gender::Unknown);
    assert_eq!(merged.records.len(), 1);
    assert!(merged.records.iter().all(|record| record.name == "রহিম"));
}

#[test]
fn name_stops_at_next_anchor_on_the_same_line() {
    let text = "1. নাম: রহিম 2. নাম: করিম";
    let extraction = extractor().extract_page(text, Gender::Unknown);

    assert_eq!(extraction.records.len(), 1);
    assert_eq!(extraction.records[0].name, "রহিম");
}

#[test]
fn page_gender_marker_applies_to_every_record_and_carries_forward() {
    let page = "ভোটার তালিকা (মহিলা)\n1. নাম: সালমা\n2. নাম: রোকসানা";
    let extraction = extractor().extract_page(page, Gender::Unknown);

    assert_eq!(extraction.gender, Gender::Female);
    assert!(
        extraction
            .records
            .iter()
            .all(|record| record.gender == Gender::Female)
    );

    let next_page = extractor().extract_page("5. নাম: আমেনা", extraction.gender);
    assert_eq!(next_page.records[0].gender, Gender::Female);
}

#[test]
fn detect_gender_checks_female_marker_first() {
    assert_eq!(detect_gender("পুরুষ ভোটার"), Some(Gender::Male));
    assert_eq!(detect_gender("মহিলা ও পুরুষ"), Some(Gender::Female));
    assert_eq!(detect_gender("ভোটার তালিকা"), None);
}

#[test]
fn prepare_text_drops_table_glyphs_and_carriage_returns() {
    assert_eq!(prepare_text("| 1. নাম: [রহিম] «x»\r\n"), " 1. নাম: রহিম x\n");
}

#[test]
fn record_key_uses_the_serial_value() {
    assert_eq!(record_key("05"), "5");
    assert_eq!(record_key("5"), "5");
    assert_eq!(record_key("000"), "0");
}

#[test]
fn cleaner_truncates_address_at_embedded_father_label() {
    let cleaner = FieldCleaner::new().expect("cleaner should build");

    assert_eq!(cleaner.clean_address("ঢাকা পিতা: রহিম"), "ঢাকা");
    assert_eq!(cleaner.clean("ঢাকা পিতা: রহিম", &ADDRESS), "ঢাকা");
}

#[test]
fn cleaner_truncates_at_repeated_own_label_and_strips_noise() {
    let cleaner = FieldCleaner::new().expect("cleaner should build");

    assert_eq!(cleaner.clean("রহিম পিতা: করিম", &FATHER), "রহিম");
    assert_eq!(cleaner.clean("\"রহিম\"  123456 উদ্দিন", &FATHER), "রহিম উদ্দিন");
}

#[test]
fn cleaner_keeps_house_numbers_in_addresses() {
    let cleaner = FieldCleaner::new().expect("cleaner should build");

    assert_eq!(
        cleaner.clean_address("বাড়ি 12345, (রোড 7)"),
        "বাড়ি 12345, রোড 7"
    );
}

#[test]
fn cleaner_truncates_doubled_address_block() {
    let cleaner = FieldCleaner::new().expect("cleaner should build");
    let block = "গ্রাম হরিপুর ডাকঘর সদর উপজেলা";
    let doubled = format!("{block}, {block}");

    assert_eq!(cleaner.truncate_doubled_address(&doubled), block);
    assert_eq!(cleaner.truncate_doubled_address(block), block);
}

#[test]
fn merge_fills_empty_fields_from_other_strategy() {
    let cleaner = FieldCleaner::new().expect("cleaner should build");
    let strategy_a = vec![record(1, "রহিম")];
    let strategy_b = vec![VoterRecord {
        father_name: "রহিম".to_string(),
        ..record(1, "রহিম")
    }];

    let merged = merge_strategies(strategy_a, strategy_b, &cleaner, 10);
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].father_name, "রহিম");
}

#[test]
fn merge_prefers_longer_identifiers() {
    let cleaner = FieldCleaner::new().expect("cleaner should build");
    let short = VoterRecord {
        voter_no: "1234".to_string(),
        ..record(7, "করিম")
    };
    let long = VoterRecord {
        voter_no: "123456".to_string(),
        ..record(7, "করিম")
    };

    let merged = merge_strategies(vec![short.clone()], vec![long.clone()], &cleaner, 10);
    assert_eq!(merged[0].voter_no, "123456");

    let merged = merge_strategies(vec![long], vec![short], &cleaner, 10);
    assert_eq!(merged[0].voter_no, "123456");
}

#[test]
fn merge_prefers_fully_qualified_birth_date() {
    let cleaner = FieldCleaner::new().expect("cleaner should build");
    let partial = VoterRecord {
        date_of_birth: "1/2/80".to_string(),
        ..record(2, "করিম")
    };
    let full = VoterRecord {
        date_of_birth: "01/02/1980".to_string(),
        ..record(2, "করিম")
    };

    let merged = merge_strategies(vec![partial], vec![full], &cleaner, 10);
    assert_eq!(merged[0].date_of_birth, "01/02/1980");
}

#[test]
fn merge_prefers_higher_script_density_and_keeps_ties() {
    let cleaner = FieldCleaner::new().expect("cleaner should build");
    let contaminated = VoterRecord {
        mother_name: "রহিমা মাতা".to_string(),
        ..record(3, "করিম")
    };
    let clean = VoterRecord {
        mother_name: "রহিমা বেগম".to_string(),
        ..record(3, "করিম")
    };
    let merged = merge_strategies(vec![contaminated], vec![clean], &cleaner, 10);
    assert_eq!(merged[0].mother_name, "রহিমা বেগম");

    let first = VoterRecord {
        mother_name: "সালমা".to_string(),
        ..record(3, "করিম")
    };
    let second = VoterRecord {
        mother_name: "আমেনা".to_string(),
        ..record(3, "করিম")
    };
    let merged = merge_strategies(vec![first], vec![second], &cleaner, 10);
    assert_eq!(merged[0].mother_name, "সালমা");
}

#[test]
fn script_density_score_penalizes_label_tokens() {
    assert_eq!(script_density_score("রহিম", 10), 4);
    assert_eq!(script_density_score("রহিম পিতা", 10), 8 - 10);
    assert_eq!(script_density_score("", 10), 0);
}

#[test]
fn merge_sorts_by_serial_and_post_cleans_artifacts() {
    let cleaner = FieldCleaner::new().expect("cleaner should build");
    let later = record(9, "করিম");
    let earlier = VoterRecord {
        mother_name: "রোকেয়া বেগম পেশা: গৃহিণী".to_string(),
        father_name: "রহিম মাতা: সালমা,".to_string(),
        ..record(2, "রহিম")
    };

    let merged = merge_strategies(vec![later, earlier], Vec::new(), &cleaner, 10);
    assert_eq!(merged[0].serial_no, 2);
    assert_eq!(merged[1].serial_no, 9);
    assert_eq!(merged[0].mother_name, "রোকেয়া বেগম");
    assert_eq!(merged[0].father_name, "রহিম");
}

#[test]
fn merge_keys_serials_by_value() {
    let text_a = "05. নাম: রহিম\nপিতা: করিম";
    let text_b = "5. নাম: রহিম\nমাতা: সালমা";

    let outcome = extractor().merge_page(text_a, text_b, Gender::Unknown);
    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.records[0].father_name, "করিম");
    assert_eq!(outcome.records[0].mother_name, "সালমা");
}

#[test]
fn merge_page_keeps_column_strategy_records_when_full_page_finds_none() {
    let columns = ["রহিম", "করিম", "সালমা", "আমেনা", "জামাল"]
        .iter()
        .enumerate()
        .map(|(index, name)| format!("{}. নাম: {name}\nপিতা: রফিক\n", index + 1))
        .collect::<Vec<String>>()
        .join("\n");

    let outcome = extractor().merge_page("ঝাপসা পাতা", &columns, Gender::Unknown);
    assert_eq!(outcome.strategy_a_count, 0);
    assert_eq!(outcome.strategy_b_count, 5);
    assert_eq!(outcome.records.len(), 5);
    assert_eq!(
        outcome
            .records
            .iter()
            .map(|record| record.serial_no)
            .collect::<Vec<u32>>(),
        vec![1, 2, 3, 4, 5]
    );
}

#[test]
fn deduplicate_fills_gaps_without_overriding() {
    let page_one = vec![VoterRecord {
        father_name: "রহিম".to_string(),
        ..record(4, "করিম")
    }];
    let page_two = vec![
        VoterRecord {
            father_name: "অন্য নাম যা অনেক লম্বা".to_string(),
            mother_name: "সালমা".to_string(),
            ..record(4, "করিম")
        },
        record(1, "আমেনা"),
    ];

    let deduplicated = deduplicate(vec![page_one, page_two]);
    assert_eq!(deduplicated.len(), 2);
    assert_eq!(deduplicated[0].cr, "1");
    assert_eq!(deduplicated[1].father_name, "রহিম");
    assert_eq!(deduplicated[1].mother_name, "সালমা");
}

#[test]
fn deduplicate_is_idempotent() {
    let pages = vec![
        vec![record(3, "করিম"), record(1, "রহিম")],
        vec![
            VoterRecord {
                address: "ঢাকা".to_string(),
                ..record(3, "করিম")
            },
            record(2, "সালমা"),
        ],
    ];

    let once = deduplicate(pages);
    let twice = deduplicate(vec![once.clone()]);
    assert_eq!(once, twice);
}

#[test]
fn bengali_char_count_ignores_ascii_and_normalized_digits() {
    assert_eq!(bengali_char_count("রহিম 12"), 4);
    assert_eq!(bengali_char_count(&normalize_text("১২")), 0);
}

#[test]
fn merge_page_prefers_a_printed_marker_over_the_carried_gender() {
    let text = "মহিলা ভোটার তালিকা\n1. নাম: সালমা খাতুন\n";

    let outcome = extractor().merge_page(text, "", Gender::Male);
    assert_eq!(outcome.gender, Gender::Female);
    assert_eq!(outcome.records[0].gender, Gender::Female);

    let unmarked = extractor().merge_page("2. নাম: আমেনা বেগম\n", "", Gender::Female);
    assert_eq!(unmarked.gender, Gender::Female);
}

#[test]
fn extract_pasted_keeps_every_record_in_text_order() {
    let text = "মহিলা\n2. নাম: সালমা খাতুন\n1. নাম: আমেনা বেগম\n\u{000C}2. নাম: সালমা খাতুন\nপিতা: রফিক উদ্দিন\n";
    let records = extractor().extract_pasted(text.split('\u{000C}'));

    let summary = records
        .iter()
        .map(|record| (record.serial_no, record.gender))
        .collect::<Vec<(u32, Gender)>>();
    assert_eq!(
        summary,
        vec![(2, Gender::Female), (1, Gender::Female), (2, Gender::Female)]
    );
    assert_eq!(records[0].father_name, "");
    assert_eq!(records[2].father_name, "রফিক উদ্দিন");

    assert!(extractor().extract_pasted(["কোনো তালিকা নেই"]).is_empty());
}
