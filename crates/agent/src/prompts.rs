//! Prompt text: the NetHack action vocabulary, the default system prompt,
//! and every instruction block the agent appends during a step.

/// Allowed NetHack commands and what they do.
pub const ACTIONS: &[(&str, &str)] = &[
    ("north", "move north"),
    ("east", "move east"),
    ("south", "move south"),
    ("west", "move west"),
    ("northeast", "move northeast"),
    ("southeast", "move southeast"),
    ("southwest", "move southwest"),
    ("northwest", "move northwest"),
    ("far north", "move far north"),
    ("far east", "move far east"),
    ("far south", "move far south"),
    ("far west", "move far west"),
    ("far northeast", "move far northeast"),
    ("far southeast", "move far southeast"),
    ("far southwest", "move far southwest"),
    ("far northwest", "move far northwest"),
    ("up", "go up a staircase"),
    ("down", "go down a staircase (tip: you can only go down if you are standing on the stairs)"),
    ("wait", "rest one move while doing nothing"),
    ("more", "display more of the message (tip: ONLY ever use when current message ends with --More--)"),
    ("annotate", "leave a note about the level"),
    ("apply", "apply (use) a tool"),
    ("call", "name a monster or object, or add an annotation"),
    ("cast", "cast a spell"),
    ("close", "close an adjacent door"),
    ("open", "open an adjacent door"),
    ("dip", "dip an object into something"),
    ("drop", "drop an item"),
    ("droptype", "drop specific item types (specify in the next prompt)"),
    ("eat", "eat something (tip: replenish food when hungry)"),
    ("esc", "exit menu or message"),
    ("engrave", "engrave writing on the floor (tip: Elbereth)"),
    ("enhance", "advance or check weapons skills"),
    ("fire", "fire ammunition from quiver"),
    ("fight", "fight a monster (even if you only guess one is there)"),
    ("force", "force a lock"),
    ("inventory", "show your inventory"),
    ("invoke", "invoke an object's special powers"),
    ("jump", "jump to a location"),
    ("kick", "kick an enemy or a locked door or chest"),
    ("look", "look at what is under you"),
    ("loot", "loot a box on the floor"),
    ("monster", "use a monster's special ability (when polymorphed)"),
    ("offer", "offer a sacrifice to the gods (tip: on an aligned altar)"),
    ("overview", "display an overview of the dungeon"),
    ("pay", "pay your shopping bill"),
    ("pickup", "pick up things at the current location"),
    ("pray", "pray to the gods for help"),
    ("puton", "put on an accessory"),
    ("quaff", "quaff (drink) something"),
    ("quiver", "select ammunition for quiver"),
    ("read", "read a scroll or spellbook"),
    ("remove", "remove an accessory"),
    ("rub", "rub a lamp or a stone"),
    ("search", "search for hidden doors and passages"),
    ("swap", "swap wielded and secondary weapons"),
    ("takeoff", "take off one piece of armor"),
    ("takeoffall", "take off all armor"),
    ("teleport", "teleport to another level (if you have the ability)"),
    ("throw", "throw something (e.g. a dagger or dart)"),
    ("travel", "travel to a specific location on the map (tip: in the next action, specify > or < for stairs, { for fountain, and _ for altar)"),
    ("twoweapon", "toggle two-weapon combat"),
    ("untrap", "untrap something"),
    ("wear", "wear a piece of armor"),
    ("wield", "wield a weapon"),
    ("wipe", "wipe off your face"),
    ("zap", "zap a wand"),
    ("minus", "-"),
    ("space", " "),
    ("apos", "'"),
    ("0", "0"),
    ("1", "1"),
    ("2", "2"),
    ("3", "3"),
    ("4", "4"),
    ("5", "5"),
    ("6", "6"),
    ("7", "7"),
    ("8", "8"),
    ("9", "9"),
];

/// Whether `action` is one of [`ACTIONS`].
pub fn is_known_action(action: &str) -> bool {
    ACTIONS.iter().any(|(name, _)| *name == action)
}

/// System prompt listing every allowed action plus play tips.
pub fn nethack_system_prompt() -> String {
    let action_list = ACTIONS
        .iter()
        .map(|(action, description)| format!("{action}: {description}"))
        .collect::<Vec<_>>()
        .join(",\n");

    format!(
        "You are an agent playing NetHack. Below is a set of allowed actions followed by a short description of each action.
For example:
north: move north
east: move east

Here is the list of all allowed actions:

{action_list}.

Tips:
- Taking the stairs up on level 1 without the Amulet of Yendor will quit the game and you will lose. Do not take the stairs up on level 1 without the Amulet of Yendor.
- When the message asks for a completion, such as: \"What do you want to eat? [d or ?*]\", respond with the single character of the item you want to use.
- When the message asks for a direction, such as \"In what direction?\", respond with a direction.
- When the message ends with --More--, your next action should be \"more\" to see the rest of the message.
- Explore the environment to find the stairs down to the next level.
- If you keep moving in the same direction you will eventually hit a wall (\"It's solid stone\", \"It's a wall\"). Change direction to keep exploring.
- You can attack monsters by moving into them.

In a moment I will present a history of actions and observations from the game.
Your goal is to get as far as possible in the game. Explore all possible areas. Do not fixate on one action or strategy for too long. Keep the game moving."
    )
}

/// Asks for a short wiki query in `Query: <query>` form.
pub fn query_instruction(max_words: usize) -> String {
    format!(
        "Based on the game state above and the overall game instructions, generate a query that will help retrieve the most relevant strategic advice from the NetHack guide.
Your query could be about, but not limited to:
- Key aspects of the current game state (e.g., inventory items, nearby threats, environmental features).
- Whether you need offensive, defensive, or general guidance.
- Specific details that will narrow down the retrieval to a useful topic.

Your query must be a short phrase (maximum {max_words} words) that summarizes the primary strategic decision. Do not include multiple questions or detailed game state descriptions.

For example:
- \"Defensive tactics, boulder, door\"
- \"Best potion usage, goblins\"
- \"Defeat dragon\"

Please output your query in the following format:
Query: <query>"
    )
}

/// Asks for a short wiki question in `QUESTION: <question>` form.
pub fn question_instruction(max_words: usize) -> String {
    format!(
        "Assess the current situation carefully. Now imagine that you have an information-rich document for NetHack containing all the things that you encounter in the game.
Output a concise sentence (at most {max_words} words) of what you would like to get from the document. For example: \"fountain\", or \"defeat a fox\". Reply in the form of: QUESTION: <question>"
    )
}

/// Standalone summarization request; sent as a fresh single-message call.
pub fn summary_request(state_context: &str, retrieved: &str, summary_words: usize) -> String {
    format!(
        "Given the current state context and the retrieved RAG results, summarize the most relevant information for a NetHack player that they can use to make a decision.
- If you see a direction such as northnortheast, it means you should first move in the north direction and then the northeast direction. Give the direction in the order of the first direction and then the second direction.
Example: context observation: gold piece near westsouthwest -> move west and then southwest

Current State context:
{state_context}

RAG Results:
{retrieved}

Extract the most useful information from the retrieved RAG results. Be mindful of not omitting any information that specifies technical details that will be useful in making the next decision.

Your final output should be in the following format, do not add anything else before or after the format. Output Format:
Current State Summary: <summary in less than {summary_words} words>

Retrieved Summarized RAG Results:
- <Most relevant information from the retrieved RAG result 1>
- <Most relevant information from the retrieved RAG result 2>
- <...so on for all retrieved RAG results...>"
    )
}

/// Wraps a retrieval summary for the decision prompt.
pub fn summary_block(summary: &str) -> String {
    format!(
        "Below is the retrieved context from the RAG database. Use this information to help you make a decision.\n{summary}"
    )
}

/// Inlines raw retrieved documents for the decision prompt.
pub fn documents_block(documents: &[String]) -> String {
    let mut block = String::from(
        "Now go through the retrieved documents and consider the information they provide. The documents are there to help you make an informed decision.\n\nHere are the retrieved documents:\n",
    );
    for doc in documents {
        block.push('\n');
        block.push_str(doc.trim());
        block.push('\n');
    }
    block.trim_end().to_string()
}

/// Delimited action, no explanation.
pub const DECIDE_DELIMITED_NAIVE: &str = "You must choose exactly one of the listed actions and output it strictly in the following format:

<|ACTION|>YOUR_CHOSEN_ACTION<|END|>

Replace YOUR_CHOSEN_ACTION with the chosen action. Output no other text, explanation, or reasoning.";

/// Delimited action after brief reasoning.
pub const DECIDE_DELIMITED_COT: &str = "First, think about the best course of action.
Then, you must choose exactly one of the listed actions and output it strictly in the following format:

<|ACTION|>YOUR_CHOSEN_ACTION<|END|>

Explain your action choice in not more than 15 words.";

/// Delimited action with a worked example and a validity check.
pub const DECIDE_DELIMITED_COT_IMPROVED: &str = "First, think about the best course of action.
Then, you must choose exactly one of the listed actions and output it strictly in the following format:

<|ACTION|>YOUR_CHOSEN_ACTION<|END|>

Replace YOUR_CHOSEN_ACTION with the chosen action. Verify that the action you provided is a valid action from the list of actions given.

In case you want to choose the action \"far east\", you must output:
<|ACTION|>far east<|END|>
Explain your action choice in not more than 20 words.";

/// `ACTION:` after step-by-step reasoning, no retrieval.
pub const DECIDE_KEYWORD_COT: &str = "First think about what's the best course of action step by step.
Finally, provide a single output action at the end of the message in the form of: ACTION: <action>";

/// `ACTION:` after reasoning over a retrieval summary.
pub const DECIDE_KEYWORD_SUMMARY: &str = "First think about what's the best course of action step by step.
Then, you must choose exactly one of the listed actions and output a single action at the end of the message in the form of: ACTION: <action>
Explain your action choice in not more than 20 words.";

/// `ACTION:` after reasoning over raw retrieved documents.
pub const DECIDE_KEYWORD_DOCUMENTS: &str = "Now think about what's the best course of action step by step. The retrieved documents might not be completely accurate, so use your best judgement.
Finally, provide a valid single output action (**crosscheck that the output action is a valid action given in the list of actions**) at the end of the message in the form of: ACTION: <action>";

/// Minimal last-resort prompt used when a step fails.
pub const RECOVERY_INSTRUCTION: &str =
    "Output a single valid action in the format <|ACTION|>action<|END|>.";
