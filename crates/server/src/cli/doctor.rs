use sentinel_domain::config::{Config, ConfigSeverity};

/// Run all diagnostic checks and print a summary.
///
/// Returns `Ok(true)` when every check passes, `Ok(false)` when at least
/// one check failed.
pub fn run(config: &Config, config_path: &str) -> anyhow::Result<bool> {
    println!("sentinel doctor");
    println!("===============\n");

    let mut all_passed = true;

    check_config_file(config_path, &mut all_passed);
    check_config_validation(config, &mut all_passed);
    check_db_path(config, &mut all_passed);
    check_admin_token(config);
    check_dialectic_secret();

    println!();
    if all_passed {
        println!("All checks passed.");
    } else {
        println!("Some checks failed. Review the output above.");
    }

    Ok(all_passed)
}

fn check_config_file(config_path: &str, all_passed: &mut bool) {
    let exists = std::path::Path::new(config_path).exists();
    print_check(
        "Config file exists",
        exists,
        if exists {
            config_path.to_owned()
        } else {
            format!("{config_path} not found (using defaults)")
        },
    );
    if !exists {
        *all_passed = false;
    }
}

fn check_config_validation(config: &Config, all_passed: &mut bool) {
    let issues = config.validate();
    let error_count = issues.iter().filter(|e| e.severity == ConfigSeverity::Error).count();

    if issues.is_empty() {
        print_check("Config validation", true, "no issues".into());
    } else {
        print_check(
            "Config validation",
            error_count == 0,
            format!("{} issue(s) ({} error(s))", issues.len(), error_count),
        );
        for issue in &issues {
            println!("      {issue}");
        }
        if error_count > 0 {
            *all_passed = false;
        }
    }
}

fn check_db_path(config: &Config, all_passed: &mut bool) {
    let path = &config.server.db_path;
    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    let writable = match parent {
        Some(dir) => {
            if !dir.exists() && std::fs::create_dir_all(dir).is_err() {
                false
            } else {
                let probe = dir.join(".sentinel_doctor_probe");
                let ok = std::fs::write(&probe, b"probe").is_ok();
                let _ = std::fs::remove_file(&probe);
                ok
            }
        }
        None => true,
    };

    print_check(
        "Database path writable",
        writable,
        if writable {
            path.display().to_string()
        } else {
            format!("{} (not writable)", path.display())
        },
    );
    if !writable {
        *all_passed = false;
    }
}

fn check_admin_token(config: &Config) {
    let set = std::env::var(&config.admin.token_env).is_ok();
    print_check(
        "Admin bearer token configured",
        true,
        if set {
            format!("{} is set", config.admin.token_env)
        } else {
            format!("{} unset — admin-gated operations are disabled", config.admin.token_env)
        },
    );
}

fn check_dialectic_secret() {
    let set = std::env::var(sentinel_governance::DIALECTIC_SECRET_ENV).is_ok();
    print_check(
        "Dialectic signing secret configured",
        true,
        if set {
            format!("{} is set", sentinel_governance::DIALECTIC_SECRET_ENV)
        } else {
            format!(
                "{} unset — an ephemeral secret will be generated at startup",
                sentinel_governance::DIALECTIC_SECRET_ENV
            )
        },
    );
}

fn print_check(name: &str, passed: bool, detail: String) {
    let status = if passed { "PASS" } else { "FAIL" };
    println!("  [{status}] {name}: {detail}");
}
