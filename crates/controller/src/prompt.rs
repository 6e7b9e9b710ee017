//! System prompt construction from an agent profile.

use std::fmt::Write;

use serde_json::Value;

use autoloop_core::types::AgentProfile;

/// Background every strategy agent is given.
const STRATEGY_BACKGROUND: &str = "\
You can call an on-chain strategy contract that holds the supported tokens; \
every decision you make is executed through that contract.

Knowledge base:
- A strategy pairs an on-chain liquidity pool with an AI that manages the pool's tokens.
- A strategy is either public or private. Only public strategies can be forked (cloned).
- Forking costs the fork cost in SONIC, paid to the strategy creator. A fork is always private.
- A fork inherits everything from its base strategy except visibility and fork cost.
- Supported tokens and allowed actions are fixed by the strategy creator.
- The split ratio decides how a deposit is divided across the supported tokens.";

/// Appended to free-text prompts, where no on-chain call can be made.
pub const TEXT_ONLY_NOTE: &str = "\
This is a conversation, not an execution context: you cannot perform on-chain \
actions here, but you may describe the strategy you would execute.";

/// Build the system prompt for `profile`.
pub fn build_system_prompt(profile: &AgentProfile) -> String {
    let mut prompt = profile.bio.join("\n");

    if !profile.traits.is_empty() {
        prompt.push_str("\n\nYour key traits are:");
        for t in &profile.traits {
            let _ = write!(prompt, "\n- {t}");
        }
    }

    if let Some(visibility) = &profile.visibility {
        let _ = write!(prompt, "\nYour visibility status is {visibility}");
    }
    if let Some(cost) = profile.fork_cost {
        let _ = write!(prompt, "\nYour fork cost is {cost} SONIC");
    }
    if let Some(deposit) = profile.minimum_deposit {
        let _ = write!(prompt, "\nYour minimum deposit is {deposit} USD");
    }
    if let Some(address) = &profile.strategy_address {
        let _ = write!(prompt, "\nYour strategy contract address is {address}");
    }

    if !profile.tokens.is_empty() {
        prompt.push_str("\n\nYour supported tokens are strictly:");
        for token in &profile.tokens {
            let _ = write!(prompt, "\n- {token}");
        }
    }

    if !is_empty(&profile.strategies) {
        let _ = write!(prompt, "\n\nYour strategies are: {}", profile.strategies);
    }

    prompt.push_str("\n\n");
    prompt.push_str(STRATEGY_BACKGROUND);
    prompt.trim_start().to_string()
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_profile() {
        let profile = AgentProfile {
            bio: vec!["You are Edgar.".into(), "You trade carefully.".into()],
            traits: vec!["patient".into()],
            tokens: vec!["0xBTC".into(), "0xETH".into()],
            strategies: json!({"none": ["Hold."]}),
            strategy_address: Some("0xabc".into()),
            visibility: Some("public".into()),
            minimum_deposit: Some(10.0),
            fork_cost: Some(2.5),
            ..Default::default()
        };
        let prompt = build_system_prompt(&profile);
        assert!(prompt.starts_with("You are Edgar.\nYou trade carefully."));
        assert!(prompt.contains("- patient"));
        assert!(prompt.contains("Your fork cost is 2.5 SONIC"));
        assert!(prompt.contains("Your strategy contract address is 0xabc"));
        assert!(prompt.contains("- 0xETH"));
        assert!(prompt.contains(r#"Your strategies are: {"none":["Hold."]}"#));
        assert!(prompt.ends_with(STRATEGY_BACKGROUND));
    }

    #[test]
    fn test_empty_profile_has_background_only() {
        let prompt = build_system_prompt(&AgentProfile::default());
        assert_eq!(prompt, STRATEGY_BACKGROUND);
    }
}
