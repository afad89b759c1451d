use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "doc-checker")]
#[command(about = "Проверка документов на соответствие эталонному шаблону", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Каталог хранилища шаблонов (по умолчанию — каталог данных пользователя)
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Проверить документ и показать несоответствия
    Check {
        /// Путь к документу (JSON-дерево контейнеров)
        #[arg(required = true)]
        document: PathBuf,

        /// Имя или идентификатор шаблона
        #[arg(short, long)]
        template: String,

        /// Сохранить отчет о несоответствиях в JSON-файл
        #[arg(short, long)]
        report: Option<PathBuf>,
    },

    /// Исправить несоответствия в документе
    Fix {
        /// Путь к документу (JSON-дерево контейнеров)
        #[arg(required = true)]
        document: PathBuf,

        /// Имя или идентификатор шаблона
        #[arg(short, long)]
        template: String,

        /// Готовый отчет проверки; без него проверка выполняется заново
        #[arg(short, long)]
        report: Option<PathBuf>,

        /// Исправить все найденное без интерактивного выбора
        #[arg(long)]
        all: bool,

        /// Исправить копию документа по этому пути, не трогая оригинал
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Операции с шаблонами
    Template {
        #[command(subcommand)]
        command: TemplateCommands,
    },

    /// Добавить вариант поля (обучение на найденных ошибках)
    Learn {
        /// Имя или идентификатор шаблона
        #[arg(required = true)]
        template: String,

        /// Идентификатор поля (1-11)
        #[arg(short, long)]
        field: u32,

        /// Текст варианта
        #[arg(short, long)]
        text: String,

        /// Добавить как допустимый вариант (по умолчанию — ошибочный)
        #[arg(long)]
        valid: bool,

        /// Удалить вариант вместо добавления
        #[arg(long)]
        remove: bool,
    },
}

#[derive(Subcommand)]
pub enum TemplateCommands {
    /// Создать шаблон со стандартным набором из 11 полей
    New {
        #[arg(required = true)]
        name: String,

        /// Описание шаблона
        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// Показать список шаблонов
    List,

    /// Показать поля шаблона
    Show {
        #[arg(required = true)]
        name: String,
    },

    /// Удалить шаблон
    Delete {
        #[arg(required = true)]
        name: String,
    },

    /// Задать эталонное значение поля
    SetField {
        #[arg(required = true)]
        name: String,

        /// Идентификатор поля (1-11)
        #[arg(short, long)]
        field: u32,

        /// Эталонное значение; пустое значение отключает проверку поля
        #[arg(short, long)]
        value: String,
    },
}
