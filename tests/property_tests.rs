use proptest::prelude::*;
use rust_decimal::Decimal;

use learnhub_api::{
    entities::DiscountType,
    services::{
        assessments::{score_answers, AnswerInput, QuizQuestion},
        coupons::calculate_discount,
        enrollment::completion_percentage,
    },
};

fn cents(raw: u64) -> Decimal {
    Decimal::from(raw) / Decimal::from(100)
}

proptest! {
    #[test]
    fn fixed_discount_never_exceeds_subtotal(value in 0u64..10_000_000, subtotal in 0u64..10_000_000) {
        let discount = calculate_discount(DiscountType::Fixed, cents(value), cents(subtotal));
        prop_assert!(discount >= Decimal::ZERO);
        prop_assert!(discount <= cents(subtotal));
    }

    #[test]
    fn percentage_discount_bounded_by_subtotal(pct in 0u32..=100u32, subtotal in 0u64..10_000_000) {
        let discount = calculate_discount(
            DiscountType::Percentage,
            Decimal::from(pct),
            cents(subtotal),
        );
        prop_assert!(discount >= Decimal::ZERO);
        prop_assert!(discount <= cents(subtotal));
    }

    #[test]
    fn percentage_discount_is_monotonic_in_rate(pct in 0u32..100u32, subtotal in 1u64..10_000_000) {
        let lower = calculate_discount(DiscountType::Percentage, Decimal::from(pct), cents(subtotal));
        let higher = calculate_discount(DiscountType::Percentage, Decimal::from(pct + 1), cents(subtotal));
        prop_assert!(lower <= higher);
    }

    #[test]
    fn completion_percentage_bounded(completed in 0u64..1000, total in 0u64..1000) {
        let completed = completed.min(total);
        let pct = completion_percentage(completed, total);
        prop_assert!(pct >= Decimal::ZERO);
        prop_assert!(pct <= Decimal::from(100));
    }

    #[test]
    fn quiz_score_bounded(answers in proptest::collection::vec((0i64..10, 0i64..10), 0..20)) {
        let questions: Vec<QuizQuestion> = (0..5)
            .map(|id| QuizQuestion {
                id,
                prompt: String::new(),
                options: vec![],
                correct_answer_id: id % 3,
            })
            .collect();
        let answers: Vec<AnswerInput> = answers
            .into_iter()
            .map(|(question_id, answer_id)| AnswerInput { question_id, answer_id })
            .collect();

        let score = score_answers(&questions, &answers);
        prop_assert!(score >= Decimal::ZERO);
        prop_assert!(score <= Decimal::from(100));
    }
}
