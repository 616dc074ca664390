//! Integration tests for the phased resolver.
//!
//! These drive the full LOCAL -> REGISTRY -> SEARCH_ENGINE -> VERIFY
//! chain against a scripted mock browser, covering the headline
//! scenarios: footer identifiers, tracking-number rejection with
//! navigation, exhausted attempts, and learned-pattern priority.

use std::sync::Arc;
use std::time::Duration;

use resolver::testing::{MockBrowser, MockInference, MockRegistry, PageSpec};
use resolver::{
    ActionKind, DataType, ExtractionMethod, InteractiveResolver, PageSession,
    PatternLearningEngine, Phase, RegistryRecord, ResolveConfig, ResolveError,
};

fn resolver_with(
    inference: MockInference,
    registry: MockRegistry,
    learning: PatternLearningEngine,
) -> InteractiveResolver<MockInference, MockRegistry> {
    InteractiveResolver::new(Arc::new(inference), Arc::new(registry), Arc::new(learning))
}

fn default_resolver() -> InteractiveResolver<MockInference, MockRegistry> {
    resolver_with(
        MockInference::new(),
        MockRegistry::new(),
        PatternLearningEngine::in_memory(),
    )
}

#[tokio::test]
async fn footer_inn_is_found_locally_with_zero_steps() {
    let browser = MockBrowser::new().with_page(
        "https://romashka.ru/",
        PageSpec::new("ООО «Ромашка». Доставка по всей России. ИНН 7712345678"),
    );
    let resolver = default_resolver();

    let page = browser.open_page().await.unwrap();
    let attempt = resolver
        .resolve(page.as_ref(), "romashka.ru", "https://romashka.ru/")
        .await
        .unwrap();

    assert!(attempt.success);
    assert_eq!(attempt.inn.as_deref(), Some("7712345678"));
    assert_eq!(attempt.phase_reached, Phase::Local);
    assert!(attempt.actions_taken.is_empty());

    let proof = attempt.result.unwrap();
    assert_eq!(proof.method, ExtractionMethod::LocalPattern);
    assert!(proof.context_snippet.contains("ИНН"));
}

#[tokio::test]
async fn tracking_number_is_rejected_and_real_inn_found_two_clicks_away() {
    // The homepage carries only an analytics counter ID; the real
    // identifier lives on /contacts, reachable via /about.
    let browser = MockBrowser::new()
        .with_page(
            "https://acme.ru/",
            PageSpec::new("Сварочное оборудование оптом")
                .with_html("<script>ym(7712345678, 'init', {clickmap:true});</script>")
                .with_link("О компании", "/about"),
        )
        .with_page(
            "https://acme.ru/about",
            PageSpec::new("Мы работаем с 2005 года").with_link("Контакты", "/contacts"),
        )
        .with_page(
            "https://acme.ru/contacts",
            PageSpec::new("Реквизиты: ИНН 7707083893, info@acme.ru"),
        );
    let resolver = default_resolver();

    let page = browser.open_page().await.unwrap();
    let attempt = resolver
        .resolve(page.as_ref(), "acme.ru", "https://acme.ru/")
        .await
        .unwrap();

    assert!(attempt.success);
    assert_eq!(attempt.inn.as_deref(), Some("7707083893"));
    assert_eq!(attempt.phase_reached, Phase::SearchEngine);
    assert!(attempt.actions_taken.len() >= 2);
    assert!(attempt.emails.contains(&"info@acme.ru".to_string()));

    let proof = attempt.result.unwrap();
    assert_eq!(proof.method, ExtractionMethod::InteractiveAgent);
    assert_eq!(proof.url, "https://acme.ru/contacts");
}

#[tokio::test]
async fn exhausted_attempts_is_a_clean_not_found() {
    // Two pages linking to each other, no identifier anywhere; the
    // inference mock always answers "0" so every step clicks something.
    let browser = MockBrowser::new()
        .with_page(
            "https://loop.ru/",
            PageSpec::new("Каталог товаров").with_link("Товары", "/tovary"),
        )
        .with_page(
            "https://loop.ru/tovary",
            PageSpec::new("Наши товары").with_link("Главная", "/"),
        );
    let resolver = default_resolver();

    let page = browser.open_page().await.unwrap();
    let attempt = resolver
        .resolve(page.as_ref(), "loop.ru", "https://loop.ru/")
        .await
        .unwrap();

    assert!(!attempt.success);
    assert!(attempt.error_message.is_none());
    assert_eq!(attempt.actions_taken.len(), 15);
    assert_eq!(attempt.phase_reached, Phase::SearchEngine);
}

#[tokio::test]
async fn bounded_attempts_holds_for_any_max() {
    let browser = MockBrowser::new().with_page(
        "https://loop.ru/",
        PageSpec::new("Каталог").with_link("Товары", "/tovary"),
    );
    let resolver = default_resolver()
        .with_config(ResolveConfig::default().with_max_attempts(3));

    let page = browser.open_page().await.unwrap();
    let attempt = resolver
        .resolve(page.as_ref(), "loop.ru", "https://loop.ru/")
        .await
        .unwrap();

    assert!(attempt.actions_taken.len() <= 3);
}

#[tokio::test]
async fn registry_phase_resolves_extracted_legal_name() {
    let browser = MockBrowser::new().with_page(
        "https://vektor.ru/",
        PageSpec::new("© 2024 ООО «Вектор». Производство металлоконструкций."),
    );
    let registry = MockRegistry::new().with_record(
        "ООО Вектор",
        RegistryRecord::new("7707083893", "ООО \"ВЕКТОР\"").with_status("ACTIVE"),
    );
    let resolver = resolver_with(
        MockInference::new(),
        registry,
        PatternLearningEngine::in_memory(),
    );

    let page = browser.open_page().await.unwrap();
    let attempt = resolver
        .resolve(page.as_ref(), "vektor.ru", "https://vektor.ru/")
        .await
        .unwrap();

    assert!(attempt.success);
    assert_eq!(attempt.inn.as_deref(), Some("7707083893"));
    assert_eq!(attempt.phase_reached, Phase::Registry);
    assert_eq!(attempt.result.unwrap().method, ExtractionMethod::Registry);
    assert!(attempt.actions_taken.is_empty());
}

#[tokio::test]
async fn learned_patterns_steer_navigation_before_fallbacks() {
    let learning = PatternLearningEngine::in_memory();
    learning
        .learn_from_confirmed_success(
            "zavod.ru",
            DataType::Inn,
            "7707083893",
            &["https://zavod.ru/rekvizity".to_string()],
        )
        .await
        .unwrap();

    // Both a contacts link and a requisites link are visible. The
    // fallback list alone would pick contacts first; the learned
    // requisites pattern must win.
    let browser = MockBrowser::new()
        .with_page(
            "https://zavod.ru/",
            PageSpec::new("Промышленное оборудование")
                .with_link("Контакты", "/contacts")
                .with_link("Реквизиты", "/rekvizity"),
        )
        .with_page(
            "https://zavod.ru/rekvizity",
            PageSpec::new("ООО «Завод», ИНН 7707083893"),
        )
        .with_page("https://zavod.ru/contacts", PageSpec::new("Телефон: +7 495 000-00-00"));

    let resolver = resolver_with(
        MockInference::new(),
        MockRegistry::new(),
        learning,
    );

    let page = browser.open_page().await.unwrap();
    let attempt = resolver
        .resolve(page.as_ref(), "zavod.ru", "https://zavod.ru/")
        .await
        .unwrap();

    assert!(attempt.success);
    assert_eq!(attempt.actions_taken.len(), 1);
    assert_eq!(attempt.actions_taken[0].target, "/rekvizity");
    assert!(attempt.actions_taken[0].rationale.contains("/requisites"));
}

#[tokio::test]
async fn verification_rejects_a_value_that_vanished_on_reread() {
    // Navigation finds an identifier on a page whose content changes
    // before re-extraction; the cleared attempt must not report it.
    let browser = MockBrowser::new()
        .with_page(
            "https://flaky.ru/",
            PageSpec::new("Главная").with_link("Контакты", "/contacts"),
        )
        .with_page(
            "https://flaky.ru/contacts",
            PageSpec::new("Реквизиты: ИНН 7707083893"),
        )
        .with_page_revision(
            "https://flaky.ru/contacts",
            PageSpec::new("Содержимое страницы обновилось"),
        );
    let resolver = default_resolver();

    let page = browser.open_page().await.unwrap();
    let attempt = resolver
        .resolve(page.as_ref(), "flaky.ru", "https://flaky.ru/")
        .await
        .unwrap();

    assert!(!attempt.success);
    assert!(attempt.inn.is_none());
    assert!(attempt.result.is_none());
    assert!(attempt.error_message.is_none());
    assert_eq!(attempt.phase_reached, Phase::Verify);
}

#[tokio::test]
async fn unusable_inference_gives_up_cleanly() {
    // No pattern matches the only link, and inference is down.
    let browser = MockBrowser::new().with_page(
        "https://opaque.ru/",
        PageSpec::new("Добро пожаловать").with_link("Портфолио", "/portfolio"),
    );
    let resolver = resolver_with(
        MockInference::new().failing(),
        MockRegistry::new(),
        PatternLearningEngine::in_memory(),
    );

    let page = browser.open_page().await.unwrap();
    let attempt = resolver
        .resolve(page.as_ref(), "opaque.ru", "https://opaque.ru/")
        .await
        .unwrap();

    assert!(attempt.is_not_found());
    let last = attempt.actions_taken.last().unwrap();
    assert_eq!(last.action, ActionKind::GiveUp);
}

#[tokio::test]
async fn deadline_stops_navigation_without_an_error() {
    let browser = MockBrowser::new().with_page(
        "https://slow.ru/",
        PageSpec::new("Загрузка...").with_link("Контакты", "/contacts"),
    );
    let resolver = default_resolver()
        .with_config(ResolveConfig::default().with_timeout(Duration::ZERO));

    let page = browser.open_page().await.unwrap();
    let attempt = resolver
        .resolve(page.as_ref(), "slow.ru", "https://slow.ru/")
        .await
        .unwrap();

    assert!(attempt.is_not_found());
    assert!(attempt.actions_taken.is_empty());
}

#[tokio::test]
async fn dead_session_propagates_as_an_error() {
    let browser = MockBrowser::new().fail_navigation_to("https://dead.ru/");
    let resolver = default_resolver();

    let page = browser.open_page().await.unwrap();
    let result = resolver
        .resolve(page.as_ref(), "dead.ru", "https://dead.ru/")
        .await;

    assert!(matches!(result, Err(ResolveError::Session(_))));
}

#[tokio::test]
async fn registry_failure_falls_through_to_navigation() {
    // Registry is down, but the contacts page still yields the value.
    let browser = MockBrowser::new()
        .with_page(
            "https://fallback.ru/",
            PageSpec::new("ООО «Фоллбек»").with_link("Контакты", "/contacts"),
        )
        .with_page(
            "https://fallback.ru/contacts",
            PageSpec::new("ИНН 7707083893"),
        );
    let resolver = resolver_with(
        MockInference::new(),
        MockRegistry::new().failing(),
        PatternLearningEngine::in_memory(),
    );

    let page = browser.open_page().await.unwrap();
    let attempt = resolver
        .resolve(page.as_ref(), "fallback.ru", "https://fallback.ru/")
        .await
        .unwrap();

    assert!(attempt.success);
    assert_eq!(attempt.phase_reached, Phase::SearchEngine);
}
