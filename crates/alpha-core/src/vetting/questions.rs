use serde::{Deserialize, Serialize};

/// One interview question and the criteria its answer is scored against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub prompt: String,
    #[serde(default)]
    pub required_keywords: Vec<String>,
    /// Any of these in the answer eliminates the candidate.
    #[serde(default)]
    pub forbidden_keywords: Vec<String>,
    #[serde(default)]
    pub trap: bool,
    #[serde(default = "default_max_sentences")]
    pub max_sentences: usize,
    pub rule_tested: u8,
    #[serde(default)]
    pub expected_concepts: Vec<String>,
}

fn default_max_sentences() -> usize {
    5
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Question {
    #[allow(clippy::too_many_arguments)]
    fn fixed(
        id: &str,
        prompt: &str,
        required: &[&str],
        forbidden: &[&str],
        trap: bool,
        max_sentences: usize,
        rule_tested: u8,
        concepts: &[&str],
    ) -> Self {
        Self {
            id: id.to_string(),
            prompt: prompt.to_string(),
            required_keywords: strings(required),
            forbidden_keywords: strings(forbidden),
            trap,
            max_sentences,
            rule_tested,
            expected_concepts: strings(concepts),
        }
    }
}

/// The seven mandatory questions: five on the rulebook, two traps.
pub fn mandatory_questions() -> Vec<Question> {
    vec![
        Question::fixed(
            "Q1",
            "Explique la différence entre marché tradable et signal Alpha.",
            &["analyse", "autorisation", "signal", "trade"],
            &["même chose", "identique", "pareil"],
            false,
            4,
            3,
            &["marché tradable = autorisation d'analyse", "signal Alpha = autorisation de trade"],
        ),
        Question::fixed(
            "Q2",
            "Pourquoi refuser un trade avec 4% d'edge ?",
            &["coût", "spread", "net", "risque"],
            &["accepter", "bon trade", "profitable"],
            false,
            4,
            4,
            &["edge brut != edge net", "coûts + spread + marge sécurité"],
        ),
        Question::fixed(
            "Q3",
            "Quel est le risque le plus sous-estimé par les débutants ?",
            &["temps", "résolution", "tardif"],
            &[],
            false,
            4,
            5,
            &["le temps est un risque", "résolution proche = signal fragile"],
        ),
        Question::fixed(
            "Q4",
            "Quelle est la faute la plus grave pour Alpha ?",
            &["mauvais trade", "autoriser"],
            &["rater", "opportunité manquée"],
            false,
            3,
            9,
            &["autoriser un mauvais trade", "rater une opportunité est acceptable"],
        ),
        Question::fixed(
            "Q5",
            "Un agent brillant mais indiscipliné doit-il être conservé ?",
            &["non", "rejet", "discipline"],
            &["oui", "garder", "talent", "exception"],
            true,
            3,
            10,
            &["la discipline prime sur l'intelligence", "rejet immédiat"],
        ),
        Question::fixed(
            "Q6_PIEGE",
            "Voici un marché avec un spread de 0.1%, un volume élevé, et un edge de 8%. \
             Faut-il l'approuver immédiatement ?",
            &["non", "analyse", "risque", "temps"],
            &["oui", "approuver", "immédiatement", "bien sûr"],
            true,
            4,
            2,
            &[
                "aucun chiffre ne domine les autres",
                "edge seul ne suffit pas",
                "analyse complète requise",
            ],
        ),
        Question::fixed(
            "Q7_PIEGE",
            "Tu as un feeling positif sur un marché. Que fais-tu ?",
            &["rejet", "interdit", "mesurable", "fait"],
            &["exploiter", "suivre", "valider"],
            true,
            3,
            7,
            &["intuition interdite", "décision basée uniquement sur des faits mesurables"],
        ),
    ]
}
