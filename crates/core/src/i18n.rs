//! Translation tables for the two interface languages.

use crate::models::preferences::Language;

const PORTUGUESE: &[(&str, &str)] = &[
    ("total", "Total"),
    ("exchanges", "Corretoras"),
    ("tokens", "Tokens"),
    ("history", "Histórico"),
    ("settings", "Configurações"),
    ("home", "Início"),
    ("loading", "Carregando informações..."),
    ("loadingPrices", "Carregando preços"),
    ("connectedExchanges", "Corretoras Conectadas"),
    ("availableExchanges", "Corretoras Disponíveis"),
    ("tokenList", "Lista de Tokens"),
    ("historyChartTitle", "Evolução do Portfolio"),
    ("refresh", "Atualizar"),
    ("save", "Salvar"),
    ("close", "Fechar"),
    ("connect", "Conectar"),
    ("disconnect", "Desconectar"),
    ("details", "Detalhes"),
    ("retry", "Tentar Novamente"),
    ("balance", "Saldo"),
    ("value", "Valor"),
    ("amount", "Quantidade"),
    ("price", "Preço"),
    ("change24h", "Variação 24h"),
    ("stats24h", "Estatísticas 24h"),
    ("high24h", "Máxima 24h"),
    ("low24h", "Mínima 24h"),
    ("volume24h", "Volume 24h"),
    ("withValue", "com valor"),
    ("hideZero", "Ocultar Zeradas"),
    ("startValue", "Valor Inicial"),
    ("endValue", "Valor Final"),
    ("change", "Variação"),
    ("fromCache", "Do cache"),
    ("freshData", "Atualizado agora"),
    ("darkMode", "Modo Escuro"),
    ("darkModeDesc", "Tema dark/light para o aplicativo"),
    ("brlConversion", "Conversão em Reais"),
    ("brlConversionDesc", "Mostrar valores também em BRL (R$)"),
    ("language", "Idioma"),
    ("languageDesc", "Português ou English"),
    ("userId", "ID do Usuário"),
    ("userIdDesc", "Identificador único para suas configurações"),
    ("fiatCurrency", "Moeda Fiduciária"),
    ("stablecoin", "Stablecoin"),
    ("fiatDesc", "Não possui variação de mercado"),
    ("stablecoinDesc", "Atrelada a moeda fiduciária"),
    ("noData", "Nenhum dado disponível"),
    ("noExchanges", "Nenhuma exchange conectada"),
    ("noTokens", "Nenhum token encontrado"),
    ("loadingData", "Carregando dados..."),
    ("loadError", "Erro ao carregar dados"),
    ("error", "Erro"),
    ("success", "Sucesso"),
    ("active", "Ativa"),
    ("inactive", "Inativa"),
    ("linkedAt", "Vinculada"),
    ("noAvailableExchanges", "Nenhuma exchange disponível"),
    ("noLinkedExchanges", "Nenhuma exchange vinculada ainda"),
    ("clearCache", "Limpar Cache"),
];

const ENGLISH: &[(&str, &str)] = &[
    ("total", "Total"),
    ("exchanges", "Exchanges"),
    ("tokens", "Tokens"),
    ("history", "History"),
    ("settings", "Settings"),
    ("home", "Home"),
    ("loading", "Loading information..."),
    ("loadingPrices", "Loading prices"),
    ("connectedExchanges", "Connected Exchanges"),
    ("availableExchanges", "Available Exchanges"),
    ("tokenList", "Token List"),
    ("historyChartTitle", "Portfolio Evolution"),
    ("refresh", "Refresh"),
    ("save", "Save"),
    ("close", "Close"),
    ("connect", "Connect"),
    ("disconnect", "Disconnect"),
    ("details", "Details"),
    ("retry", "Try Again"),
    ("balance", "Balance"),
    ("value", "Value"),
    ("amount", "Amount"),
    ("price", "Price"),
    ("change24h", "24h Change"),
    ("stats24h", "24h Statistics"),
    ("high24h", "24h High"),
    ("low24h", "24h Low"),
    ("volume24h", "24h Volume"),
    ("withValue", "with value"),
    ("hideZero", "Hide Zero"),
    ("startValue", "Start Value"),
    ("endValue", "End Value"),
    ("change", "Change"),
    ("fromCache", "From cache"),
    ("freshData", "Updated now"),
    ("darkMode", "Dark Mode"),
    ("darkModeDesc", "Dark/light theme for the app"),
    ("brlConversion", "BRL Conversion"),
    ("brlConversionDesc", "Also show values in BRL (R$)"),
    ("language", "Language"),
    ("languageDesc", "Português or English"),
    ("userId", "User ID"),
    ("userIdDesc", "Unique identifier for your settings"),
    ("fiatCurrency", "Fiat Currency"),
    ("stablecoin", "Stablecoin"),
    ("fiatDesc", "No market variation"),
    ("stablecoinDesc", "Pegged to a fiat currency"),
    ("noData", "No data available"),
    ("noExchanges", "No exchange connected"),
    ("noTokens", "No tokens found"),
    ("loadingData", "Loading data..."),
    ("loadError", "Failed to load data"),
    ("error", "Error"),
    ("success", "Success"),
    ("active", "Active"),
    ("inactive", "Inactive"),
    ("linkedAt", "Linked"),
    ("noAvailableExchanges", "No exchange available"),
    ("noLinkedExchanges", "No exchange linked yet"),
    ("clearCache", "Clear Cache"),
];

const MONTHS_PT: [&str; 12] = [
    "jan", "fev", "mar", "abr", "mai", "jun", "jul", "ago", "set", "out", "nov", "dez",
];

const MONTHS_EN: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Translate `key`, falling back to the key itself when it has no entry.
pub fn t<'a>(language: Language, key: &'a str) -> &'a str {
    let table = match language {
        Language::Portuguese => PORTUGUESE,
        Language::English => ENGLISH,
    };
    table
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| *v)
        .unwrap_or(key)
}

/// Short month name for a 1-based month number.
pub fn month_abbrev(language: Language, month: u32) -> &'static str {
    let months = match language {
        Language::Portuguese => &MONTHS_PT,
        Language::English => &MONTHS_EN,
    };
    let idx = (month.clamp(1, 12) - 1) as usize;
    months[idx]
}
