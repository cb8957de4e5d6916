//! Fixed prompt templates for the four generation actions.
//!
//! Every template interpolates user input verbatim; no sanitization or
//! rewriting happens on the way to the inference API.

/// Sampling parameters sent with a chat-completion request.
#[derive(Debug, Clone, Copy)]
pub struct Sampling {
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Vision probes are short classification-style answers.
pub const VISION_SAMPLING: Sampling = Sampling {
    temperature: 0.5,
    max_tokens: 300,
};

/// Recipe generations need room for full instructions.
pub const RECIPE_SAMPLING: Sampling = Sampling {
    temperature: 0.7,
    max_tokens: 1200,
};

/// Text part sent alongside a dish photo.
pub const DISH_PROBE: &str = "What dish or food is shown in this image?";

/// Text part sent alongside an ingredients photo.
pub const INGREDIENT_PROBE: &str = "List all visible ingredients in this image.";

/// Preference list applied when recipes are chained off an ingredient photo,
/// where the user never picked preferences themselves.
pub const DEFAULT_DIETARY_PREFERENCES: &[&str] =
    &["Vegetarian", "Vegan", "Gluten-Free", "Low-Carb"];

/// Full-recipe prompt for a dish name detected from a photo.
pub fn recipe_from_detected_dish(dish_name: &str) -> String {
    format!(
        "\
You are an expert chef. Based on this dish name, generate a full recipe.

Dish Name: {dish_name}

Generate:
1. Name of the dish
2. List of required ingredients
3. Step-by-step instructions
4. Estimated cooking time
5. Dietary notes (e.g., vegan, gluten-free if applicable)

Make sure the recipe is safe to eat and matches the detected dish.
"
    )
}

/// Three-recipe prompt chained off ingredients detected from a photo.
pub fn creative_recipes_from_ingredients(ingredients: &str) -> String {
    let preferences = DEFAULT_DIETARY_PREFERENCES.join(", ");
    format!(
        "\
You are an expert chef. Based on these ingredients, generate 3 creative recipes.

Ingredients: {ingredients}
Dietary Preferences: {preferences}

For each recipe:
1. Name
2. Ingredients
3. Instructions
4. Cooking time
5. Substitution suggestions

Ensure recipes match dietary preferences and are safe to eat.
"
    )
}

/// Three-recipe prompt for a typed ingredient list. An empty preference
/// selection renders as an explicit "no preferences" line.
pub fn recipes_from_ingredients(ingredients: &str, dietary_preferences: &[String]) -> String {
    let preferences = if dietary_preferences.is_empty() {
        "No specific dietary preferences".to_string()
    } else {
        dietary_preferences.join(", ")
    };
    format!(
        "\
You are an expert chef and assistant. Based on these ingredients and dietary preferences, generate 3 recipes.

Ingredients: {ingredients}
Dietary Preferences: {preferences}

For each recipe:
1. Name of the dish
2. List of ingredients needed
3. Step-by-step instructions
4. Estimated cooking time
5. Notes on possible substitutions if ingredients are missing

Ensure all recipes match dietary preferences. If certain core ingredients are missing, adjust the recipe safely.
"
    )
}

/// Detailed-recipe prompt for a typed dish name. A missing ingredient
/// override renders as "Assume full access".
pub fn recipe_by_dish_name(dish_name: &str, available_ingredients: Option<&str>) -> String {
    let available = match available_ingredients {
        Some(s) if !s.trim().is_empty() => s,
        _ => "Assume full access",
    };
    format!(
        "\
You are an expert chef and assistant. Provide a detailed recipe for '{dish_name}'.

Available ingredients: {available}

If key ingredients are missing, morph the recipe safely using common substitutes.
Always provide 3 variations of the recipe:
1. Original version
2. Adapted version using available ingredients
3. Alternate dish that can be made with similar flavor or theme

Include:
- Ingredients needed
- Step-by-step instructions
- Estimated cooking time
- Dietary notes if applicable
- Safety note if substitutions were made

Make sure none of the recipes would harm someone eating them.
"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_is_interpolated_verbatim() {
        let prompt = recipe_from_detected_dish("Shakshuka <with> \"peppers\"");
        assert!(prompt.contains("Dish Name: Shakshuka <with> \"peppers\""));
    }

    #[test]
    fn empty_preferences_render_default_phrase() {
        let prompt = recipes_from_ingredients("eggs, flour", &[]);
        assert!(prompt.contains("Dietary Preferences: No specific dietary preferences"));
    }

    #[test]
    fn preferences_are_comma_joined() {
        let prefs = vec!["Vegan".to_string(), "Keto".to_string()];
        let prompt = recipes_from_ingredients("tofu", &prefs);
        assert!(prompt.contains("Dietary Preferences: Vegan, Keto"));
    }

    #[test]
    fn missing_ingredient_override_assumes_full_access() {
        let prompt = recipe_by_dish_name("Ramen", None);
        assert!(prompt.contains("Available ingredients: Assume full access"));

        let prompt = recipe_by_dish_name("Ramen", Some("   "));
        assert!(prompt.contains("Available ingredients: Assume full access"));

        let prompt = recipe_by_dish_name("Ramen", Some("noodles, miso"));
        assert!(prompt.contains("Available ingredients: noodles, miso"));
    }
}
