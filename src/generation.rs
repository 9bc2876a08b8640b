use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::providers::traits::CompletionProvider;

const SYSTEM_MESSAGE: &str = "You are a professional chef and recipe creator. \
    Generate creative, practical, and delicious recipes based on the provided \
    ingredients. Always respond with valid JSON in the exact format requested.";

/// Staple pantry items used to pad fallback recipes and their shopping
/// lists when the user supplied fewer ingredients than a template needs.
const STAPLES: &[&str] = &[
    "olive oil",
    "salt",
    "black pepper",
    "garlic",
    "onion",
    "lemon juice",
];

const PLACEHOLDER_INGREDIENT: &str = "pantry staples";

/// Everything that can go wrong between "prompt sent" and "usable drafts".
/// One error kind per failure mode so callers never see a raw parse panic.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("completion call failed: {0}")]
    Upstream(anyhow::Error),

    #[error("model reply was not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("model reply had the wrong shape: {0}")]
    Shape(String),
}

/// An unpersisted recipe as the model returns it, before the store assigns
/// an id and timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeDraft {
    pub title: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    #[serde(default)]
    pub cooking_time: Option<String>,
    #[serde(default)]
    pub servings: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub suggested_additions: Option<Vec<String>>,
}

/// The optional fourth recipe: a normal draft plus a shopping list of
/// ingredients the user does not already have.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BonusDraft {
    #[serde(flatten)]
    pub recipe: RecipeDraft,
    pub shopping_list: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct GeneratedBatch {
    pub recipes: Vec<RecipeDraft>,
    pub bonus: Option<BonusDraft>,
}

#[derive(Debug, Deserialize)]
struct GenerationPayload {
    recipes: Vec<RecipeDraft>,
    #[serde(default)]
    bonus: Option<BonusDraft>,
}

/// Turns an ingredient string into recipe drafts via the configured
/// completion provider. Holds no mutable state.
pub struct RecipeGenerator {
    provider: Box<dyn CompletionProvider + Send + Sync>,
    recipe_count: usize,
    bonus_enabled: bool,
}

impl RecipeGenerator {
    pub fn new(
        provider: Box<dyn CompletionProvider + Send + Sync>,
        recipe_count: usize,
        bonus_enabled: bool,
    ) -> Self {
        Self {
            provider,
            recipe_count,
            bonus_enabled,
        }
    }

    /// One shot, no retries: a failed call is a failed generation.
    pub async fn generate(&self, ingredients: &str) -> Result<GeneratedBatch, GenerationError> {
        let prompt = build_prompt(ingredients, self.recipe_count, self.bonus_enabled);
        debug!(model = self.provider.model(), "requesting recipe completion");

        let reply = self
            .provider
            .complete(SYSTEM_MESSAGE, &prompt, true)
            .await
            .map_err(GenerationError::Upstream)?;

        parse_reply(&reply, self.recipe_count, self.bonus_enabled)
    }
}

/// Fixed natural-language instruction block embedding the ingredient string
/// and a strict description of the expected JSON document.
fn build_prompt(ingredients: &str, recipe_count: usize, bonus: bool) -> String {
    let mut prompt = format!(
        "I have these ingredients: {ingredients}. \n\n\
         Please generate exactly {recipe_count} diverse and creative recipes I can make \
         using these ingredients. For each recipe, provide:\n\
         1. A creative and appetizing title\n\
         2. A complete list of ingredients needed (including the ones I provided plus \
         any additional basic ingredients)\n\
         3. Step-by-step cooking instructions\n\
         4. Estimated cooking time\n\
         5. Number of servings\n\
         6. Difficulty level (Easy, Medium, or Hard)\n\
         7. 2-3 suggested additional ingredients that would enhance the recipe\n\n\
         Respond with a JSON object containing an array of recipes. Each recipe should \
         have this exact structure:\n\
         {{\n\
           \"recipes\": [\n\
             {{\n\
               \"title\": \"Recipe Name\",\n\
               \"ingredients\": [\"ingredient 1\", \"ingredient 2\"],\n\
               \"instructions\": [\"step 1\", \"step 2\"],\n\
               \"cookingTime\": \"X mins\",\n\
               \"servings\": \"X servings\",\n\
               \"difficulty\": \"Easy/Medium/Hard\",\n\
               \"suggestedAdditions\": [\"suggestion 1\", \"suggestion 2\"]\n\
             }}\n\
           ]\n\
         }}"
    );

    if bonus {
        prompt.push_str(
            "\n\nAlso include one extra \"bonus\" recipe under a top-level \"bonus\" key. \
             It has the same structure as the other recipes plus a \"shoppingList\" array \
             listing the ingredients it needs that are NOT in my list above. The shopping \
             list must not be empty.",
        );
    }

    prompt.push_str(
        "\n\nMake sure the recipes are practical, delicious, and use the ingredients \
         I provided as main components.",
    );

    prompt
}

/// Parse and shape-check a model reply. All-or-nothing: one bad field
/// rejects the whole batch.
fn parse_reply(
    reply: &str,
    expected_count: usize,
    bonus_required: bool,
) -> Result<GeneratedBatch, GenerationError> {
    let payload: GenerationPayload = serde_json::from_str(strip_code_fences(reply))?;

    if payload.recipes.len() != expected_count {
        return Err(GenerationError::Shape(format!(
            "expected {} recipes, got {}",
            expected_count,
            payload.recipes.len()
        )));
    }

    let bonus = match (bonus_required, payload.bonus) {
        (true, None) => {
            return Err(GenerationError::Shape("missing bonus recipe".to_string()));
        }
        (true, Some(b)) if b.shopping_list.is_empty() => {
            return Err(GenerationError::Shape(
                "bonus recipe has an empty shopping list".to_string(),
            ));
        }
        (true, Some(b)) => Some(b),
        // Not requested: drop anything the model volunteered.
        (false, _) => None,
    };

    Ok(GeneratedBatch {
        recipes: payload.recipes,
        bonus,
    })
}

/// Models sometimes wrap the JSON document in Markdown code fences even
/// when asked not to.
fn strip_code_fences(text: &str) -> &str {
    let mut s = text.trim();
    if let Some(rest) = s.strip_prefix("```json") {
        s = rest.trim_start();
    } else if let Some(rest) = s.strip_prefix("```") {
        s = rest.trim_start();
    }
    if let Some(rest) = s.strip_suffix("```") {
        s = rest.trim_end();
    }
    s
}

/// Deterministic local recipes for when the completion call fails and the
/// fallback policy is enabled. Derived from the comma-separated ingredient
/// tokens; never indexes past what the user actually typed.
pub fn fallback_batch(ingredients: &str, recipe_count: usize, bonus: bool) -> GeneratedBatch {
    let tokens: Vec<String> = ingredients
        .to_lowercase()
        .split(',')
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();

    let lead = tokens
        .first()
        .cloned()
        .unwrap_or_else(|| PLACEHOLDER_INGREDIENT.to_string());

    let templates: [(&str, &str, &[&str], &[&str]); 3] = [
        (
            "Mediterranean",
            "Bowl",
            &["lemon juice", "oregano", "olive oil", "feta cheese"],
            &["cherry tomatoes", "kalamata olives", "fresh basil"],
        ),
        (
            "Asian-Style",
            "Stir Fry",
            &["soy sauce", "ginger", "sesame oil"],
            &["broccoli florets", "cashews", "green onions"],
        ),
        (
            "Rustic",
            "One-Pot",
            &["vegetable broth", "paprika", "bay leaf"],
            &["green peas", "crusty bread", "lemon wedges"],
        ),
    ];

    let recipes = (0..recipe_count)
        .map(|i| {
            let (style, dish, extras, additions) = templates[i % templates.len()];
            // Use whichever tokens exist; the slice bound tracks the token
            // count, not the template index.
            let used = tokens.len().min(3 + i);
            let mut recipe_ingredients: Vec<String> = tokens[..used].to_vec();
            if recipe_ingredients.is_empty() {
                recipe_ingredients.push(PLACEHOLDER_INGREDIENT.to_string());
            }
            recipe_ingredients.extend(extras.iter().map(|s| s.to_string()));

            RecipeDraft {
                title: format!("{style} {lead} {dish}"),
                ingredients: recipe_ingredients,
                instructions: vec![
                    format!("Prep the {lead} and any vegetables."),
                    "Heat a pan over medium-high heat with a little oil.".to_string(),
                    format!("Cook the {lead} until done, then add the remaining ingredients."),
                    "Season to taste and serve hot.".to_string(),
                ],
                cooking_time: Some("25 mins".to_string()),
                servings: Some("4 servings".to_string()),
                difficulty: Some("Easy".to_string()),
                suggested_additions: Some(additions.iter().map(|s| s.to_string()).collect()),
            }
        })
        .collect();

    let bonus = bonus.then(|| {
        let shopping_list: Vec<String> = STAPLES
            .iter()
            .map(|s| s.to_string())
            .filter(|s| !tokens.contains(s))
            .collect();

        let mut bonus_ingredients = tokens.clone();
        if bonus_ingredients.is_empty() {
            bonus_ingredients.push(PLACEHOLDER_INGREDIENT.to_string());
        }
        bonus_ingredients.extend(shopping_list.iter().cloned());

        BonusDraft {
            recipe: RecipeDraft {
                title: format!("Weeknight {lead} Skillet"),
                ingredients: bonus_ingredients,
                instructions: vec![
                    "Pick up the shopping list items below.".to_string(),
                    format!("Saute the {lead} with the aromatics."),
                    "Combine everything in one skillet and simmer for 15 minutes.".to_string(),
                ],
                cooking_time: Some("30 mins".to_string()),
                servings: Some("4 servings".to_string()),
                difficulty: Some("Easy".to_string()),
                suggested_additions: None,
            },
            shopping_list,
        }
    });

    GeneratedBatch { recipes, bonus }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_recipe_json(title: &str) -> String {
        format!(
            r#"{{
                "title": "{title}",
                "ingredients": ["chicken", "rice"],
                "instructions": ["Cook it."],
                "cookingTime": "20 mins",
                "servings": "2 servings",
                "difficulty": "Easy",
                "suggestedAdditions": ["lime"]
            }}"#
        )
    }

    fn sample_reply(with_bonus: bool) -> String {
        let recipes = format!(
            "[{}, {}, {}]",
            sample_recipe_json("One"),
            sample_recipe_json("Two"),
            sample_recipe_json("Three")
        );
        if with_bonus {
            format!(
                r#"{{"recipes": {recipes}, "bonus": {{
                    "title": "Bonus",
                    "ingredients": ["chicken"],
                    "instructions": ["Cook."],
                    "shoppingList": ["saffron"]
                }}}}"#
            )
        } else {
            format!(r#"{{"recipes": {recipes}}}"#)
        }
    }

    #[test]
    fn prompt_embeds_ingredients_and_count() {
        let prompt = build_prompt("chicken, rice, garlic", 3, true);
        assert!(prompt.contains("chicken, rice, garlic"));
        assert!(prompt.contains("exactly 3"));
        assert!(prompt.contains("shoppingList"));

        let no_bonus = build_prompt("tofu", 3, false);
        assert!(!no_bonus.contains("shoppingList"));
    }

    #[test]
    fn parses_a_well_formed_reply() {
        let batch = parse_reply(&sample_reply(true), 3, true).unwrap();
        assert_eq!(batch.recipes.len(), 3);
        let bonus = batch.bonus.unwrap();
        assert_eq!(bonus.recipe.title, "Bonus");
        assert_eq!(bonus.shopping_list, vec!["saffron"]);
    }

    #[test]
    fn parses_reply_wrapped_in_code_fences() {
        let fenced = format!("```json\n{}\n```", sample_reply(false));
        let batch = parse_reply(&fenced, 3, false).unwrap();
        assert_eq!(batch.recipes.len(), 3);
    }

    #[test]
    fn rejects_non_json_reply() {
        let err = parse_reply("Sorry, I can't cook today.", 3, false).unwrap_err();
        assert!(matches!(err, GenerationError::Malformed(_)));
    }

    #[test]
    fn rejects_wrong_recipe_count() {
        let reply = format!(r#"{{"recipes": [{}]}}"#, sample_recipe_json("Only"));
        let err = parse_reply(&reply, 3, false).unwrap_err();
        assert!(matches!(err, GenerationError::Shape(_)));
    }

    #[test]
    fn rejects_missing_bonus_when_required() {
        let err = parse_reply(&sample_reply(false), 3, true).unwrap_err();
        assert!(matches!(err, GenerationError::Shape(_)));
    }

    #[test]
    fn rejects_empty_shopping_list() {
        let reply = sample_reply(true).replace(r#"["saffron"]"#, "[]");
        let err = parse_reply(&reply, 3, true).unwrap_err();
        assert!(matches!(err, GenerationError::Shape(_)));
    }

    #[test]
    fn fallback_titles_embed_the_first_token() {
        let batch = fallback_batch("chicken, rice, garlic", 3, false);
        assert_eq!(batch.recipes.len(), 3);
        for recipe in &batch.recipes {
            assert!(recipe.title.contains("chicken"), "title: {}", recipe.title);
        }
    }

    #[test]
    fn fallback_handles_fewer_than_three_tokens() {
        let batch = fallback_batch("eggs", 3, true);
        for recipe in &batch.recipes {
            assert!(recipe.ingredients.contains(&"eggs".to_string()));
        }

        // Whitespace-only tokens collapse to the placeholder.
        let empty = fallback_batch(" , ,", 3, false);
        assert!(empty.recipes[0].title.contains(PLACEHOLDER_INGREDIENT));
        assert!(empty.recipes[0]
            .ingredients
            .contains(&PLACEHOLDER_INGREDIENT.to_string()));
    }

    #[test]
    fn fallback_bonus_shopping_list_excludes_owned_ingredients() {
        let batch = fallback_batch("garlic, onion", 3, true);
        let bonus = batch.bonus.unwrap();
        assert!(!bonus.shopping_list.is_empty());
        assert!(!bonus.shopping_list.contains(&"garlic".to_string()));
        assert!(!bonus.shopping_list.contains(&"onion".to_string()));
    }

    #[test]
    fn fallback_is_deterministic() {
        let a = fallback_batch("chicken, rice", 3, true);
        let b = fallback_batch("chicken, rice", 3, true);
        let a_json = serde_json::to_string(&a.recipes).unwrap();
        let b_json = serde_json::to_string(&b.recipes).unwrap();
        assert_eq!(a_json, b_json);
    }
}
