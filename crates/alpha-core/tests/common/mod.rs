//! Fixtures shared by the integration tests.
#![allow(dead_code)]

use alpha_core::{AgentId, AgentMode, AgentRole, CallContext, GovernanceOrchestrator, Signal};

/// Answers to the mandatory questions that pass in both agent modes.
pub const PASSING_ANSWERS: [&str; 7] = [
    "Un marché tradable donne une autorisation d'analyse. Un signal Alpha donne une autorisation de trade.",
    "L'edge brut de 4% n'est pas l'edge net. Les coûts, le spread et la marge de sécurité réduisent l'edge net et augmentent le risque.",
    "Le temps est un risque. Une résolution proche rend le signal fragile, un dénouement tardif aussi.",
    "Autoriser un mauvais trade est la faute la plus grave. Une opportunité perdue reste acceptable.",
    "Non. La discipline prime sur l'intelligence, donc rejet immédiat.",
    "Non. Aucun chiffre ne domine les autres et l'edge seul ne suffit pas. Une analyse complète du risque et du temps est requise.",
    "Rejet. Une émotion n'est pas un fait mesurable, elle est interdite. Toute décision est basée uniquement sur des faits mesurables.",
];

/// A signal that satisfies every content rule.
pub fn good_signal(id: &str) -> Signal {
    Signal::new()
        .with("signal_id", id)
        .with("market", "BTC above 100k by Friday")
        .with("type", "ARBITRAGE")
        .with("edge_net", 1.2)
        .with("volume", 25000)
        .with("spread", 0.4)
        .with("time_to_resolution", 30)
        .with("risks", "Liquidity can dry up before resolution.")
        .with("status", "APPROVED")
        .with(
            "comment",
            "Edge net confirme. Volume suffisant. Spread faible. Temps court. Risque controle.",
        )
}

/// The weak signal every reviewer should reject.
pub fn weak_signal(id: &str) -> Signal {
    Signal::new()
        .with("signal_id", id)
        .with("market", "ETH flippening")
        .with("type", "PROBA")
        .with("edge_net", "0.1")
        .with("volume", 500)
        .with("spread", 1.0)
        .with("time_to_resolution", "80")
        .with("risks", "ok")
        .with("status", "APPROVED")
        .with("comment", "Signal faible.")
}

/// Interview and activate a new agent.
pub fn recruit(orch: &GovernanceOrchestrator, name: &str, mode: AgentMode) -> AgentId {
    let eval = orch
        .evaluate_candidate(name, AgentRole::AlphaResearch, mode, &PASSING_ANSWERS, &CallContext::default())
        .unwrap()
        .unwrap();
    assert!(eval.recruited, "{:?}", eval.verdict);
    eval.agent_id
}
