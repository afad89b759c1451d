use clap::Parser;
use dialoguer::MultiSelect;
use doc_checker_rust::{cli, detector, error, patcher, template};

use cli::{Cli, Commands, TemplateCommands};
use detector::Discrepancy;
use error::{DocCheckerError, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;
use std::time::Duration;
use template::{Template, TemplateStore};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let store = match &cli.store {
        Some(dir) => TemplateStore::new(dir),
        None => TemplateStore::default_location()?,
    };

    match cli.command {
        Commands::Check {
            document,
            template,
            report,
        } => {
            println!("📋 doc-checker — проверка документа\n");
            let template = store.find(&template)?;

            println!("[1/2] Проверка по шаблону «{}»...", template.name);
            let spinner = scan_spinner();
            let discrepancies = detector::check_document(&document, &template)?;
            spinner.finish_and_clear();

            if discrepancies.is_empty() {
                println!("✅ Несоответствий не найдено");
                return Ok(());
            }

            println!("✔ Найдено несоответствий: {}\n", discrepancies.len());
            for (i, d) in discrepancies.iter().enumerate() {
                print_discrepancy(i, d);
            }

            if let Some(report_path) = report {
                println!("[2/2] Сохранение отчета...");
                let json = serde_json::to_string_pretty(&discrepancies)?;
                std::fs::write(&report_path, json)?;
                println!("✔ Отчет сохранен: {}", report_path.display());
            }
        }

        Commands::Fix {
            document,
            template,
            report,
            all,
            output,
        } => {
            println!("🛠 doc-checker — исправление документа\n");
            let template = store.find(&template)?;

            println!("[1/3] Поиск несоответствий...");
            let mut discrepancies: Vec<Discrepancy> = match report {
                Some(path) => {
                    let content = std::fs::read_to_string(&path)?;
                    serde_json::from_str(&content)?
                }
                None => detector::check_document(&document, &template)?,
            };

            if discrepancies.is_empty() {
                println!("✅ Несоответствий нет, документ не изменен");
                return Ok(());
            }
            println!("✔ Найдено: {}\n", discrepancies.len());

            if !all {
                select_discrepancies(&mut discrepancies)?;
            }
            let selected = discrepancies.iter().filter(|d| d.should_fix).count();
            if selected == 0 {
                println!("Ничего не выбрано, документ не изменен");
                return Ok(());
            }

            // Либо правим оригинал, либо его копию — «сохранить как»
            let target = match output {
                Some(copy) => {
                    std::fs::copy(&document, &copy)?;
                    copy
                }
                None => document,
            };

            println!("[2/3] Применение исправлений ({})...", selected);
            patcher::fix_document(&target, &discrepancies, &template)?;
            println!("✔ Исправления применены\n");

            println!("[3/3] Документ сохранен: {}", target.display());
            println!("\n✅ Готово");
        }

        Commands::Template { command } => run_template_command(&store, command)?,

        Commands::Learn {
            template,
            field,
            text,
            valid,
            remove,
        } => {
            let mut template = store.find(&template)?;
            let field = template
                .field_mut(field)
                .ok_or(DocCheckerError::FieldNotFound(field))?;
            let kind = if valid { "допустимый" } else { "ошибочный" };

            if remove {
                if field.remove_variant(&text, valid) {
                    println!("✔ Удален {} вариант поля «{}»: «{}»", kind, field.name, text);
                    store.save(&template)?;
                } else {
                    println!("Такого варианта нет");
                }
            } else if field.add_variant(&text, valid) {
                println!("✔ Добавлен {} вариант поля «{}»: «{}»", kind, field.name, text);
                store.save(&template)?;
            } else {
                println!("Такой вариант уже существует");
            }
        }
    }

    Ok(())
}

fn run_template_command(store: &TemplateStore, command: TemplateCommands) -> Result<()> {
    match command {
        TemplateCommands::New { name, description } => {
            let mut template = Template::with_default_fields(&name);
            template.description = description;
            store.save(&template)?;
            println!("✔ Создан шаблон «{}» ({})", template.name, template.id);
        }

        TemplateCommands::List => {
            let templates = store.load_all();
            if templates.is_empty() {
                println!("Шаблонов нет");
                return Ok(());
            }
            for template in templates {
                println!(
                    "{}  «{}»  изменен {}",
                    template.id,
                    template.name,
                    template.modified_date.format("%Y-%m-%d %H:%M")
                );
            }
        }

        TemplateCommands::Show { name } => {
            let template = store.find(&name)?;
            println!("Шаблон «{}» — {}\n", template.name, template.description);
            for field in &template.fields {
                let reference = if field.reference_value.is_empty() {
                    "(не проверяется)"
                } else {
                    &field.reference_value
                };
                println!("{:3}. {}: {}", field.id, field.name, reference);
                for variant in &field.valid_variants {
                    println!("       допустимо: «{}»", variant);
                }
                for variant in &field.invalid_variants {
                    println!("       ошибочно:  «{}»", variant);
                }
            }
        }

        TemplateCommands::Delete { name } => {
            store.delete(&name)?;
            println!("✔ Шаблон удален");
        }

        TemplateCommands::SetField { name, field, value } => {
            let mut template = store.find(&name)?;
            let field = template
                .field_mut(field)
                .ok_or(DocCheckerError::FieldNotFound(field))?;
            field.reference_value = value;
            let field_name = field.name.clone();
            store.save(&template)?;
            println!("✔ Поле «{}» обновлено", field_name);
        }
    }
    Ok(())
}

/// Интерактивный выбор несоответствий для исправления
fn select_discrepancies(discrepancies: &mut [Discrepancy]) -> Result<()> {
    let items: Vec<String> = discrepancies
        .iter()
        .map(|d| {
            format!(
                "[{}] {} — «{}» → «{}»",
                d.kind, d.location, d.found_text, d.expected_value
            )
        })
        .collect();
    let defaults = vec![true; items.len()];

    let selection = MultiSelect::new()
        .with_prompt("Выберите несоответствия для исправления")
        .items(&items)
        .defaults(&defaults)
        .interact()
        .map_err(|e| DocCheckerError::Config(format!("Ошибка интерактивного выбора: {}", e)))?;

    let selected: HashSet<usize> = selection.into_iter().collect();
    for (i, discrepancy) in discrepancies.iter_mut().enumerate() {
        discrepancy.should_fix = selected.contains(&i);
    }
    Ok(())
}

fn print_discrepancy(i: usize, d: &Discrepancy) {
    println!("{:3}. [{}] {}", i + 1, d.kind, d.location);
    println!("     Поле: {}", d.field_name);
    println!("     Найдено: «{}» → ожидается «{}»", d.found_text, d.expected_value);
    println!("     Контекст: {}\n", d.context);
}

fn scan_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("Сканирование контейнеров...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
