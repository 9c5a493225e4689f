use crate::model::CopyInputs;

/// Fixed hashtag block closing every caption.
pub const HASHTAGS: [&str; 5] = [
    "#danielmuller",
    "#danielmulleroficial",
    "#cadavezmelhor",
    "#resultados",
    "#vendas",
];

/// Builds the caption prompt: attention hook, two-paragraph interest body and
/// the fixed call to action carrying the keyword.
pub fn build_prompt(inputs: &CopyInputs) -> String {
    let subject = inputs.subject.trim();
    let question = inputs.attention_question.trim();
    let keyword = inputs.keyword.trim();
    let hashtags = HASHTAGS.join("\n   ");

    format!(
        r#"Crie um texto objetivo para a legenda de um Reels no Instagram sobre o assunto: "{subject}".

A estrutura DEVE seguir exatamente estes 3 passos:

1. [ PERGUNTA DE ATENÇÃO ] - Use exatamente esta pergunta: "{question}".
   Certifique-se de começar a frase com um emoji relacionado.

2. INTERESSE - Crie dois parágrafos persuasivos:
   - Parágrafo 1: Descreva a dor ou o problema que o assunto "{subject}" causa na audiência. Desperte o interesse em assistir o conteúdo.
   - Parágrafo 2: Descreva que existe uma solução e que o vídeo apresenta uma estratégia eficaz para vencer o problema.

3. CALL TO ACTION - Use exatamente esta estrutura final:
   👇 Se fez sentido para você, escreva [ {keyword} ] aqui embaixo.🔥
   📲 Envie para alguém que precisa destravar resultados.🚀
   👍 E fortaleça com seu LIKE ♥️

   {hashtags}

REGRA CRUCIAL: Comece ABSOLUTAMENTE CADA ORAÇÃO/FRASE com um emoji relacionado ao que está sendo dito.
O tom deve ser profissional, motivador e focado em resultados.
"#
    )
}
