use serde_json::{json, Value};

use jp_study_store::store::operations::questions::{NewQuestion, VerbForm, VerbType};
use jp_study_store::store::Store;

pub fn new_question(form: VerbForm, polite: &str, casual: &str) -> NewQuestion {
    NewQuestion {
        form,
        polite: polite.to_string(),
        casual: casual.to_string(),
        verb_type: VerbType::Godan,
        difficulty: 2,
        category: "daily".to_string(),
    }
}

/// Three te-form questions followed by two ta-form ones; ids 1..=5.
pub fn seed_mixed_questions(store: &Store) -> Vec<u64> {
    store
        .bulk_insert_questions(vec![
            new_question(VerbForm::Te, "書きます", "書いて"),
            new_question(VerbForm::Te, "読みます", "読んで"),
            new_question(VerbForm::Te, "話します", "話して"),
            new_question(VerbForm::Ta, "書きます", "書いた"),
            new_question(VerbForm::Ta, "飲みます", "飲んだ"),
        ])
        .expect("seed questions")
}

pub fn question_json(form: &str, polite: &str, casual: &str) -> Value {
    json!({
        "form": form,
        "polite": polite,
        "casual": casual,
        "verb_type": "godan",
        "difficulty": 2,
        "category": "daily",
    })
}
