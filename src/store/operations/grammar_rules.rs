use serde::{Deserialize, Serialize};

use crate::store::operations::questions::VerbForm;
use crate::store::table::{Collection, Record};
use crate::store::{Store, StoreError};
use crate::validation;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GrammarExample {
    pub polite: String,
    pub casual: String,
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GrammarRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub form: VerbForm,
    pub title: String,
    pub description: String,
    pub examples: Vec<GrammarExample>,
    pub difficulty: u8,
}

impl Record for GrammarRule {
    const COLLECTION: Collection = Collection::GrammarRules;

    fn id(&self) -> Option<u64> {
        self.id
    }

    fn assign_id(&mut self, id: u64) {
        self.id = Some(id);
    }

    fn index_entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("form", self.form.as_str().to_string()),
            ("difficulty", self.difficulty.to_string()),
        ]
    }
}

impl GrammarRule {
    pub fn validate(&self) -> Result<(), String> {
        validation::validate_id(self.id)?;
        validation::validate_non_empty("title", &self.title)?;
        validation::validate_rating("difficulty", self.difficulty)?;
        Ok(())
    }
}

fn example(polite: &str, casual: &str, explanation: &str) -> GrammarExample {
    GrammarExample {
        polite: polite.to_string(),
        casual: casual.to_string(),
        explanation: explanation.to_string(),
    }
}

/// Reference rules installed into an empty collection, one per form.
pub fn default_grammar_rules() -> Vec<GrammarRule> {
    vec![
        GrammarRule {
            id: None,
            form: VerbForm::Te,
            title: "て形".to_string(),
            description: "Connects actions and forms requests; godan endings change by sound (う・つ・る→って, む・ぶ・ぬ→んで, く→いて, ぐ→いで, す→して).".to_string(),
            examples: vec![
                example("食べます", "食べて", "ichidan: drop る, add て"),
                example("書きます", "書いて", "godan く becomes いて"),
                example("行きます", "行って", "irregular exception to the く rule"),
            ],
            difficulty: 2,
        },
        GrammarRule {
            id: None,
            form: VerbForm::Ta,
            title: "た形".to_string(),
            description: "Plain past tense; built exactly like the て形 with た/だ in place of て/で.".to_string(),
            examples: vec![
                example("飲みました", "飲んだ", "godan む becomes んだ"),
                example("見ました", "見た", "ichidan: drop る, add た"),
            ],
            difficulty: 2,
        },
        GrammarRule {
            id: None,
            form: VerbForm::Nai,
            title: "ない形".to_string(),
            description: "Plain negative; godan verbs shift the final sound to the あ row (う→わ).".to_string(),
            examples: vec![
                example("話しません", "話さない", "godan す becomes さ"),
                example("買いません", "買わない", "godan う becomes わ"),
                example("あります", "ない", "irregular negative of ある"),
            ],
            difficulty: 3,
        },
        GrammarRule {
            id: None,
            form: VerbForm::Ru,
            title: "辞書形".to_string(),
            description: "Dictionary (plain non-past) form; the ます stem returns to the う row.".to_string(),
            examples: vec![
                example("起きます", "起きる", "ichidan: replace ます with る"),
                example("待ちます", "待つ", "godan ち becomes つ"),
                example("します", "する", "irregular"),
            ],
            difficulty: 1,
        },
    ]
}

impl Store {
    pub fn add_grammar_rule(&self, rule: &GrammarRule) -> Result<GrammarRule, StoreError> {
        rule.validate().map_err(StoreError::Validation)?;
        self.put_record(rule, "add_grammar_rule")
    }

    pub fn get_grammar_rule(&self, id: u64) -> Result<Option<GrammarRule>, StoreError> {
        self.get_record(id)
    }

    pub fn list_grammar_rules(&self) -> Result<Vec<GrammarRule>, StoreError> {
        self.list_records()
    }

    pub fn grammar_rules_by_form(&self, form: VerbForm) -> Result<Vec<GrammarRule>, StoreError> {
        self.scan_index("form", form.as_str(), 0, usize::MAX)
    }

    /// Installs [`default_grammar_rules`] when no rule exists yet. Returns how many were written.
    pub fn seed_grammar_rules_if_empty(&self) -> Result<usize, StoreError> {
        if self.count_records(Collection::GrammarRules) > 0 {
            return Ok(0);
        }
        let rules = default_grammar_rules();
        for rule in &rules {
            self.add_grammar_rule(rule)?;
        }
        tracing::info!(count = rules.len(), "Seeded grammar rules");
        Ok(rules.len())
    }
}
