//! Fixed reference list of consulting methodologies seeded into the
//! `methodologies` table at startup.

use crate::types::MethodologyCategory;

pub struct CatalogEntry {
    pub code: &'static str,
    pub name: &'static str,
    pub category: MethodologyCategory,
    pub description: &'static str,
    pub typical_effort_hours: i32,
    pub requires_details: bool,
}

const fn mining(
    code: &'static str,
    name: &'static str,
    description: &'static str,
    typical_effort_hours: i32,
    requires_details: bool,
) -> CatalogEntry {
    CatalogEntry {
        code,
        name,
        category: MethodologyCategory::Mining,
        description,
        typical_effort_hours,
        requires_details,
    }
}

const fn assembling(
    code: &'static str,
    name: &'static str,
    description: &'static str,
    typical_effort_hours: i32,
    requires_details: bool,
) -> CatalogEntry {
    CatalogEntry {
        code,
        name,
        category: MethodologyCategory::Assembling,
        description,
        typical_effort_hours,
        requires_details,
    }
}

/// 11 mining (БПМ) entries followed by 25 assembling (БПА) entries.
pub const METHODOLOGY_CATALOG: &[CatalogEntry] = &[
    mining(
        "БПМ1",
        "Опросы",
        "Количественные исследования с большими выборками",
        16,
        true,
    ),
    mining(
        "БПМ2",
        "Интервью с клиентами",
        "Качественные интервью с клиентами для выявления инсайтов",
        24,
        true,
    ),
    mining(
        "БПМ3",
        "Оргинтервью",
        "Организационные интервью - анализ проблем через интервью с сотрудниками",
        12,
        true,
    ),
    mining(
        "БПМ4",
        "Кабинетный анализ",
        "Desk research: анализ вторичных данных, отчетов, документации",
        8,
        false,
    ),
    mining(
        "БПМ5",
        "Хронометраж",
        "Наблюдение и измерение временных затрат на процессы",
        16,
        true,
    ),
    mining("БПМ6", "Тайник", "Mystery shopping / Тайный покупатель", 12, true),
    mining(
        "БПМ7",
        "Ассесмент",
        "Оценка компетенций сотрудников и команды",
        8,
        true,
    ),
    mining(
        "БПМ8",
        "Фокус-группа",
        "Групповая дискуссия для выявления коллективных мнений",
        10,
        true,
    ),
    mining(
        "БПМ9",
        "Анализ база",
        "Анализ клиентской базы и данных CRM",
        20,
        true,
    ),
    mining(
        "БПМ10",
        "Анализ рынка",
        "Исследование рыночной конъюнктуры и конкурентов",
        16,
        true,
    ),
    mining(
        "БПМ11",
        "Анализ производства",
        "Исследование производственных процессов и мощностей",
        12,
        true,
    ),
    assembling(
        "БПА1",
        "Целевые клиентские группы (ЦКГ)",
        "Сегментация и описание целевых клиентских групп",
        8,
        true,
    ),
    assembling(
        "БПА2",
        "Приоритетные рынки (Оценка по 5 силам Портера)",
        "Оценка и приоритизация рынков",
        6,
        true,
    ),
    assembling("БПА3", "Как сегменты", "Сегментация рынка", 6, true),
    assembling("БПА4", "Как регионы", "Региональная сегментация", 6, true),
    assembling(
        "БПА5",
        "Целевой трафик-мэп (TM)",
        "Карта целевого трафика",
        8,
        true,
    ),
    assembling("БПА6", "Бизнес-процессы", "Описание бизнес-процессов", 10, true),
    assembling(
        "БПА7",
        "Кроссфункциональные процессы (КФП)",
        "Кроссфункциональные процессы (например, выравнивание)",
        10,
        true,
    ),
    assembling(
        "БПА8",
        "Процессы функциональных колодцев",
        "БП + примечание, например, CM, ОП, HR и т.п.",
        8,
        true,
    ),
    assembling(
        "БПА9",
        "Целевая Ассортиментная матрица (AM)",
        "Ассортиментная матрица",
        8,
        true,
    ),
    assembling(
        "БПА10",
        "Ценовая политика (Цена)",
        "Разработка ценовой политики",
        8,
        true,
    ),
    assembling(
        "БПА11",
        "Позиционирование (Бренд/УТП/EVP)",
        "Позиционирование бренда и ценностное предложение",
        10,
        true,
    ),
    assembling(
        "БПА12",
        "CJM/EJM",
        "Customer Journey Map / Employee Journey Map",
        10,
        true,
    ),
    assembling(
        "БПА13",
        "Оргструктура (ОС)",
        "Оргструктура + примечание, например, ОМ, ОП, HR и т.п.",
        6,
        true,
    ),
    assembling(
        "БПА14",
        "Модель компетенций (МК)",
        "Разработка модели компетенций",
        8,
        true,
    ),
    assembling(
        "БПА15",
        "Материалы поддержки продаж (МПП)",
        "МПП, включая книгу продаж, скрипты и т.п.",
        12,
        true,
    ),
    assembling(
        "БПА16",
        "ИТ-стек (БТ и тп)",
        "Описание ИТ-стека и бизнес-технологий",
        6,
        true,
    ),
    assembling(
        "БПА17",
        "Целевая модель данных (ЦМД)",
        "Целевая модель данных",
        10,
        true,
    ),
    assembling(
        "БПА18",
        "Рычаги роста (Брейн)",
        "Рычаги роста по доходам или расходам",
        8,
        true,
    ),
    assembling(
        "БПА19",
        "Финмодель (ФМ) или Финмашина",
        "Финансовая модель или Финмашина",
        16,
        true,
    ),
    assembling(
        "БПА20",
        "Модель Остервальдера и Пинье (ОиП) или Бизнес-модель (БМ)",
        "Бизнес-модель Остервальдера и Пинье или Бизнес-модель Canvas",
        8,
        true,
    ),
    assembling(
        "БПА21",
        "Бизнес-календари и Операционная система работ (ОСР)",
        "Бизнес-календари и ОСР",
        8,
        true,
    ),
    assembling(
        "БПА22",
        "Должностные инструкции (ДИ) или папка сотрудника",
        "Должностные инструкции или папка сотрудника",
        8,
        true,
    ),
    assembling(
        "БПА23",
        "Функциональная стратегия",
        "Разработка функциональной стратегии",
        10,
        true,
    ),
    assembling("БПА24", "Найм", "Процессы и материалы найма", 6, true),
    assembling(
        "БПА25",
        "Проведение обучения",
        "Материалы и процессы обучения",
        8,
        true,
    ),
];

#[cfg(test)]
mod tests {
    use super::METHODOLOGY_CATALOG;
    use crate::types::MethodologyCategory;

    #[test]
    fn catalog_has_36_unique_entries() {
        assert_eq!(METHODOLOGY_CATALOG.len(), 36);

        let mut names: Vec<_> = METHODOLOGY_CATALOG.iter().map(|e| e.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 36);

        let mining = METHODOLOGY_CATALOG
            .iter()
            .filter(|e| e.category == MethodologyCategory::Mining)
            .count();
        assert_eq!(mining, 11);
        assert_eq!(METHODOLOGY_CATALOG.len() - mining, 25);
    }
}
