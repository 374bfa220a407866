//! Interactive menu used when `policy-setup` is started without action flags.

use super::{health, reset, verify};
use crate::utils::prompt::Prompt;
use anyhow::Result;
use colored::*;
use policy_client::models::{
    autogen_resource_set, is_valid_key, AttributeType, ConditionSet, Conditions, Operator,
    Permission, Predicate, Resource, Role, SetRule, UserAttribute,
};
use policy_client::repositories::CreateOutcome;
use policy_client::reset::ResetScope;
use policy_client::PolicyAdmin;
use serde_json::Value;

const MENU: &[(&str, &str)] = &[
    ("1", "Verify current policy model"),
    ("2", "Check decision point health"),
    ("3", "Create resource"),
    ("4", "Create role"),
    ("5", "Create user attribute"),
    ("6", "Create user set"),
    ("7", "Create resource set"),
    ("8", "Create set rule"),
    ("9", "Replace condition set conditions"),
    ("10", "Reset ABAC (set rules, condition sets, attributes)"),
    ("11", "Reset roles"),
    ("12", "Reset resources"),
    ("13", "Full reset"),
    ("0", "Quit"),
];

pub async fn run(admin: &PolicyAdmin) -> Result<()> {
    let mut prompt = Prompt::new()?;

    loop {
        print_menu(admin);
        let Some(choice) = prompt.ask("Select an option:") else {
            break;
        };

        match choice.as_str() {
            "1" => verify::execute(admin, "text").await?,
            "2" => {
                health::execute(admin, "text").await?;
            }
            "3" => create_resource(admin, &mut prompt).await,
            "4" => create_role(admin, &mut prompt).await,
            "5" => create_attribute(admin, &mut prompt).await,
            "6" => create_user_set(admin, &mut prompt).await,
            "7" => create_resource_set(admin, &mut prompt).await,
            "8" => create_set_rule(admin, &mut prompt).await,
            "9" => update_set_conditions(admin, &mut prompt).await,
            "10" => confirm_and_reset(admin, &mut prompt, ResetScope::Abac).await,
            "11" => confirm_and_reset(admin, &mut prompt, ResetScope::Roles).await,
            "12" => confirm_and_reset(admin, &mut prompt, ResetScope::Resources).await,
            "13" => confirm_and_reset(admin, &mut prompt, ResetScope::Full).await,
            "0" | "q" | "quit" | "exit" => break,
            other => println!("{} '{}'", "Unknown option".yellow(), other),
        }
        println!();
    }

    println!("Bye");
    Ok(())
}

fn print_menu(admin: &PolicyAdmin) {
    let settings = admin.settings();
    println!(
        "{}",
        format!(
            "=== Policy Setup ({}/{}) ===",
            settings.project_id, settings.env_id
        )
        .bold()
    );
    for (key, label) in MENU {
        println!("  {:>2}) {}", key, label);
    }
}

fn report(entity: &str, key: &str, outcome: CreateOutcome) {
    match outcome {
        CreateOutcome::Created => println!("{} Created {} '{}'", "✓".green(), entity, key),
        CreateOutcome::AlreadyExists => {
            println!("{} {} '{}' already exists", "○".white(), entity, key)
        }
        CreateOutcome::Failed => println!(
            "{} Could not create {} '{}' (see log)",
            "✗".red(),
            entity,
            key
        ),
    }
}

async fn confirm_and_reset(admin: &PolicyAdmin, prompt: &mut Prompt, scope: ResetScope) {
    if prompt.confirm(&format!("This deletes {}. Continue?", reset::describe(scope))) {
        reset::run(admin, scope).await;
    } else {
        println!("{}", "Reset cancelled".yellow());
    }
}

async fn create_resource(admin: &PolicyAdmin, prompt: &mut Prompt) {
    let Some(key) = prompt.ask_key("Resource key:") else {
        return;
    };
    let Some(name) = prompt.ask_or("Display name", &key) else {
        return;
    };
    let Some(description) = prompt.ask("Description (optional):") else {
        return;
    };
    let Some(actions) = prompt.ask_keys("Actions (comma separated, e.g. read,create):") else {
        return;
    };

    let mut resource = Resource::new(key.clone(), name);
    if !description.is_empty() {
        resource = resource.with_description(description);
    }
    for action in actions {
        resource = resource.with_action(action);
    }

    report(
        "resource",
        &key,
        admin.resources().create_outcome(&resource).await,
    );
}

async fn create_role(admin: &PolicyAdmin, prompt: &mut Prompt) {
    let Some(key) = prompt.ask_key("Role key:") else {
        return;
    };
    let Some(name) = prompt.ask_or("Display name", &key) else {
        return;
    };
    let Some(description) = prompt.ask("Description (optional):") else {
        return;
    };
    let Some(permissions) =
        prompt.ask_permissions("Permissions (comma separated resource:action, optional):")
    else {
        return;
    };

    let mut role = Role::new(key.clone(), name);
    if !description.is_empty() {
        role = role.with_description(description);
    }

    let roles = admin.roles();
    let outcome = roles.create_outcome(&role).await;
    report("role", &key, outcome);
    if !outcome.is_ok() {
        return;
    }

    for permission in permissions {
        if roles
            .assign_permission(&key, &permission.resource, &permission.action)
            .await
        {
            println!("  {} granted {}", "✓".green(), permission);
        } else {
            println!("  {} could not grant {}", "✗".red(), permission);
        }
    }
}

async fn create_attribute(admin: &PolicyAdmin, prompt: &mut Prompt) {
    let Some(key) = prompt.ask_key("Attribute key:") else {
        return;
    };
    let kind = loop {
        let Some(raw) = prompt.ask_or("Type (string, number, bool, array)", "string") else {
            return;
        };
        match AttributeType::parse(&raw) {
            Some(kind) => break kind,
            None => println!("{}", "Unknown type".yellow()),
        }
    };
    let Some(description) = prompt.ask("Description (optional):") else {
        return;
    };

    let mut attribute = UserAttribute::new(key.clone(), kind);
    if !description.is_empty() {
        attribute = attribute.with_description(description);
    }

    report(
        "user attribute",
        &key,
        admin.attributes().create_outcome(&attribute).await,
    );
}

/// Collect one or more predicates; `scope` builds the attribute path.
fn ask_conditions(
    prompt: &mut Prompt,
    default_attribute: &str,
    default_operator: Operator,
    scope: fn(&str, Operator, Value) -> Predicate,
) -> Option<Conditions> {
    let mut predicates = Vec::new();
    loop {
        let attribute = prompt.ask_or("Attribute", default_attribute)?;
        let operator = loop {
            let raw = prompt.ask_or(
                "Operator (equals, not_equals, contains, starts_with, ends_with, array_contains)",
                default_operator.as_str(),
            )?;
            match Operator::parse(&raw) {
                Some(op) => break op,
                None => println!("{}", "Unknown operator".yellow()),
            }
        };
        let raw_value = prompt.ask_required("Value:")?;
        predicates.push(scope(&attribute, operator, parse_value(&raw_value)));

        if !prompt.confirm("Add another condition?") {
            break;
        }
    }
    Some(Conditions::all_of(predicates))
}

/// Numbers and booleans are sent as JSON; everything else as a string.
fn parse_value(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ (Value::Number(_) | Value::Bool(_))) => value,
        _ => Value::String(raw.to_string()),
    }
}

fn user_predicate(attribute: &str, operator: Operator, value: Value) -> Predicate {
    Predicate::user(attribute, operator, value)
}

fn resource_predicate(attribute: &str, operator: Operator, value: Value) -> Predicate {
    Predicate::resource(attribute, operator, value)
}

async fn create_user_set(admin: &PolicyAdmin, prompt: &mut Prompt) {
    let Some(key) = prompt.ask_key("User set key:") else {
        return;
    };
    let Some(name) = prompt.ask_or("Display name", &key) else {
        return;
    };
    let Some(conditions) =
        ask_conditions(prompt, "groups", Operator::ArrayContains, user_predicate)
    else {
        return;
    };

    let set = ConditionSet::user_set(key.clone(), name, conditions);
    report(
        "user set",
        &key,
        admin.condition_sets().create_outcome(&set).await,
    );
}

async fn create_resource_set(admin: &PolicyAdmin, prompt: &mut Prompt) {
    let Some(key) = prompt.ask_key("Resource set key:") else {
        return;
    };
    let Some(name) = prompt.ask_or("Display name", &key) else {
        return;
    };
    let Some(resource) = prompt.ask_key("Resource key:") else {
        return;
    };
    let Some(conditions) = ask_conditions(prompt, "owner", Operator::Equals, resource_predicate)
    else {
        return;
    };

    let set = ConditionSet::resource_set(key.clone(), name, resource, conditions);
    report(
        "resource set",
        &key,
        admin.condition_sets().create_outcome(&set).await,
    );
}

async fn update_set_conditions(admin: &PolicyAdmin, prompt: &mut Prompt) {
    let Some(key) = prompt.ask_key("Condition set key:") else {
        return;
    };
    let sets = admin.condition_sets();
    let Some(existing) = sets.get(&key).await else {
        println!("{} '{}'", "No such condition set".yellow(), key);
        return;
    };

    let conditions = if existing.is_user_set() {
        ask_conditions(prompt, "groups", Operator::ArrayContains, user_predicate)
    } else {
        ask_conditions(prompt, "owner", Operator::Equals, resource_predicate)
    };
    let Some(conditions) = conditions else {
        return;
    };

    if sets.update_conditions(&key, &conditions).await {
        println!("{} Updated conditions of '{}'", "✓".green(), key);
    } else {
        println!("{} Could not update '{}' (see log)", "✗".red(), key);
    }
}

async fn create_set_rule(admin: &PolicyAdmin, prompt: &mut Prompt) {
    let Some(user_set) = prompt.ask_required("User set key:") else {
        return;
    };
    let permission = loop {
        let Some(raw) = prompt.ask_required("Permission (resource:action):") else {
            return;
        };
        match Permission::parse(&raw) {
            Some(permission) => break permission,
            None => println!("{}", "Permissions must look like resource:action".yellow()),
        }
    };
    let Some(resource_set) =
        prompt.ask_or("Resource set key", &autogen_resource_set(&permission.resource))
    else {
        return;
    };
    if !is_valid_key(&user_set) {
        println!(
            "{}",
            format!("'{}' is not a key this tool creates; sending anyway", user_set).dimmed()
        );
    }

    let rule = SetRule::new(user_set, resource_set, &permission);
    report(
        "set rule",
        &rule.to_string(),
        admin.set_rules().create_outcome(&rule).await,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("42"), json!(42));
        assert_eq!(parse_value("true"), json!(true));
        assert_eq!(parse_value("admins"), json!("admins"));
        assert_eq!(parse_value("\"quoted\""), json!("\"quoted\""));
    }

    #[test]
    fn test_predicate_scopes() {
        let p = user_predicate("groups", Operator::ArrayContains, json!("a"));
        assert_eq!(p.attribute, "user.groups");
        let p = resource_predicate("owner", Operator::Equals, json!("b"));
        assert_eq!(p.attribute, "resource.owner");
    }
}
