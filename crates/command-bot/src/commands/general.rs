//! Small stateless commands.

use command_engine::{handler_fn, CommandSpec, InvocationResult, Overload, ParameterSpec, Value};
use rand::seq::IndexedRandom;

const EIGHT_BALL: &[&str] = &[
    "It is certain",
    "It is decidedly so",
    "Without a doubt",
    "Yes, definitely",
    "You may rely on it",
    "As I see it, yes",
    "Most likely",
    "Outlook good",
    "Yes",
    "Signs point to yes",
    "Reply hazy try again",
    "Ask again later",
    "Better not tell you now",
    "Cannot predict now",
    "Concentrate and ask again",
    "Don't count on it",
    "My reply is no",
    "My sources say no",
    "Outlook not so good",
    "Very doubtful",
];

pub fn specs() -> Vec<CommandSpec> {
    vec![hello(), echo(), eight_ball(), coin(), lmgtfy()]
}

fn hello() -> CommandSpec {
    CommandSpec::new("hello")
        .alias("test")
        .help("Says hi")
        .overload(Overload::new(handler_fn(|_ctx, _args| async {
            Ok(InvocationResult::text("Hello there! 👋"))
        })))
}

fn echo() -> CommandSpec {
    CommandSpec::new("echo")
        .alias("say")
        .help("Repeats the provided text back to you")
        .overload(
            Overload::new(handler_fn(|_ctx, args| async move {
                Ok(InvocationResult::text(args.text("text")?))
            }))
            .param(ParameterSpec::text("text").remainder()),
        )
}

fn eight_ball() -> CommandSpec {
    CommandSpec::new("8ball")
        .help("It knows your future")
        .overload(
            Overload::new(handler_fn(|ctx, args| async move {
                let answer = shake();
                let reply = match ctx.principal() {
                    Some(asker) => format!(
                        "{}: *{}*\n{}",
                        asker.display_name.as_deref().unwrap_or(&asker.id),
                        args.text("question")?,
                        answer
                    ),
                    None => answer.to_string(),
                };
                Ok(InvocationResult::text(reply))
            }))
            .param(ParameterSpec::text("question").remainder()),
        )
}

fn shake() -> &'static str {
    EIGHT_BALL
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or("Ask again later")
}

fn coin() -> CommandSpec {
    CommandSpec::new("coin")
        .aliases(["flip", "coinflip", "decide"])
        .help("Flips a coin")
        .overload(
            Overload::new(handler_fn(|_ctx, args| async move {
                let side = if rand::random::<bool>() { "side1" } else { "side2" };
                Ok(InvocationResult::text(args.text(side)?))
            }))
            .param(ParameterSpec::text("side1").default_value(Value::Text("Heads".into())))
            .param(ParameterSpec::text("side2").default_value(Value::Text("Tails".into()))),
        )
}

fn lmgtfy() -> CommandSpec {
    CommandSpec::new("lmgtfy")
        .help("For when people forget how to use a search engine")
        .overload(
            Overload::new(handler_fn(|_ctx, args| async move {
                let query = args.text("query")?;
                Ok(InvocationResult::text(format!(
                    "https://lmgtfy.app/?q={}",
                    urlencoding::encode(query)
                )))
            }))
            .param(ParameterSpec::text("query").remainder()),
        )
}

#[cfg(test)]
mod tests {
    use crate::testing::{bot, direct, group, run};
    use command_engine::InvocationResult;

    #[tokio::test]
    async fn test_hello_and_alias() {
        let bot = bot();
        assert_eq!(
            run(&bot, group("+3000", "!hello")).await,
            InvocationResult::text("Hello there! 👋")
        );
        assert_eq!(
            run(&bot, direct("+3000", "!TEST")).await,
            InvocationResult::text("Hello there! 👋")
        );
    }

    #[tokio::test]
    async fn test_echo_requires_text() {
        let bot = bot();
        assert_eq!(
            run(&bot, group("+3000", "!say  two   words ")).await,
            InvocationResult::text("two words")
        );
        assert_eq!(
            run(&bot, group("+3000", "!echo")).await,
            InvocationResult::error_titled("Syntax Error", "Usage: `!echo <text...>`")
        );
    }

    #[tokio::test]
    async fn test_eight_ball_quotes_question() {
        let bot = bot();
        let result = run(&bot, group("+3000", "!8ball will it ship?")).await;
        let text = result.text_content().unwrap();
        let (header, answer) = text.split_once('\n').unwrap();
        assert_eq!(header, "Ada: *will it ship?*");
        assert!(super::EIGHT_BALL.contains(&answer));
    }

    #[tokio::test]
    async fn test_coin_sides() {
        let bot = bot();
        for _ in 0..10 {
            let result = run(&bot, group("+3000", "!flip")).await;
            assert!(matches!(result.text_content(), Some("Heads") | Some("Tails")));

            let result = run(&bot, group("+3000", "!decide pizza tacos")).await;
            assert!(matches!(result.text_content(), Some("pizza") | Some("tacos")));
        }
    }

    #[tokio::test]
    async fn test_lmgtfy_encodes_query() {
        let bot = bot();
        assert_eq!(
            run(&bot, group("+3000", "!lmgtfy rust & tokio")).await,
            InvocationResult::text("https://lmgtfy.app/?q=rust%20%26%20tokio")
        );
    }
}
