//! Wire-format fixtures for both PSMs.
//!
//! Every case checks three things: the encoder reproduces the expected bytes
//! exactly, the decoder accepts them, and the decoded value equals the
//! original (the round-trip law).

use gems_protocol::{
    ascii, xml, ConnectionType, Datatype, DisconnectReason, Message, MessageBuilder, MessageKind,
    ParameterBuilder, ParameterNode, ResultCode,
};

const TARGET: &str = "System/Device1";

fn param(name: &str) -> ParameterBuilder {
    ParameterBuilder::new().name(name)
}

fn channel_group(n: i32, rates: [i32; 2]) -> ParameterNode {
    let name = param("ChannelName")
        .strings([format!("Channel{n}")])
        .build()
        .unwrap();
    let id = param("ChannelID").ints([n]).build().unwrap();
    let bit_rates = param("BitRates").ints(rates).build().unwrap();
    ParameterBuilder::new()
        .name("")
        .parameters([name, id, bit_rates])
        .build()
        .unwrap()
}

fn assert_ascii(msg: &Message, expect: &str) {
    let encoded = ascii::encode_message(msg).expect("ascii encode");
    assert_eq!(encoded, expect);
    let decoded = ascii::decode_message(encoded.as_bytes()).expect("ascii decode");
    assert_eq!(&decoded, msg);
}

fn assert_xml(msg: &Message, expect: &str) {
    let encoded = xml::encode_message(msg).expect("xml encode");
    assert_eq!(encoded, expect);
    let decoded = xml::decode_message(encoded.as_bytes()).expect("xml decode");
    assert_eq!(&decoded, msg);
}

#[test]
fn connect_message() {
    let msg = MessageBuilder::new()
        .kind(MessageKind::Connect)
        .target(TARGET)
        .timestamp_str("1410819035.26")
        .transaction_id(1)
        .connection_type(ConnectionType::ControlAndStatus)
        .build()
        .unwrap();
    assert_ascii(
        &msg,
        "|GEMS|14|0000000085|1||1410819035.260000000|System/Device1|CON|CONTROL_AND_STATUS|END",
    );
    assert_xml(
        &msg,
        "<ConnectionRequestMessage xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" gems_version=\"1.4\" target=\"System/Device1\" transaction_id=\"1\" timestamp=\"1410819035.26\"><type>CONTROL_AND_STATUS</type></ConnectionRequestMessage>",
    );
}

#[test]
fn connect_response_failure() {
    let msg = MessageBuilder::new()
        .kind(MessageKind::ConnectResponse)
        .target(TARGET)
        .timestamp_str("1410819035.26")
        .transaction_id(1)
        .result_code(ResultCode::InvalidTarget)
        .response_description("Target System/Device1 does not exist in this system")
        .build()
        .unwrap();
    assert_ascii(
        &msg,
        "|GEMS|14|0000000135|1||1410819035.260000000|System/Device1|CON-R|INVALID_TARGET|Target System/Device1 does not exist in this system|END",
    );
    assert_xml(
        &msg,
        "<ConnectionRequestResponse xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" gems_version=\"1.4\" target=\"System/Device1\" transaction_id=\"1\" timestamp=\"1410819035.26\"><Result>INVALID_TARGET</Result><description>Target System/Device1 does not exist in this system</description></ConnectionRequestResponse>",
    );
}

#[test]
fn connect_response_success() {
    let msg = MessageBuilder::new()
        .kind(MessageKind::ConnectResponse)
        .target(TARGET)
        .timestamp_str("1410819035.26")
        .transaction_id(1)
        .result_code(ResultCode::Success)
        .build()
        .unwrap();
    assert_ascii(
        &msg,
        "|GEMS|14|0000000077|1||1410819035.260000000|System/Device1|CON-R|SUCCESS||END",
    );
    assert_xml(
        &msg,
        "<ConnectionRequestResponse xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" gems_version=\"1.4\" target=\"System/Device1\" transaction_id=\"1\" timestamp=\"1410819035.26\"><Result>SUCCESS</Result></ConnectionRequestResponse>",
    );
}

#[test]
fn directive_message() {
    let iterations = param("Iterations").ints([2000]).build().unwrap();
    let title = param("Title").strings(["Run 1"]).build().unwrap();
    let msg = MessageBuilder::new()
        .kind(MessageKind::Directive)
        .target(TARGET)
        .timestamp_str("1410819035.27")
        .transaction_id(1)
        .directive("StartProcessing")
        .parameters([iterations, title])
        .build()
        .unwrap();
    assert_ascii(
        &msg,
        "|GEMS|14|0000000123|1||1410819035.270000000|System/Device1|DIR|StartProcessing|2|Iterations:int=2000|Title:string=Run 1|END",
    );
    assert_xml(
        &msg,
        "<DirectiveMessage xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" gems_version=\"1.4\" target=\"System/Device1\" transaction_id=\"1\" timestamp=\"1410819035.27\"><directive_name>StartProcessing</directive_name><arguments><Parameter xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" name=\"Iterations\"><int xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\">2000</int></Parameter><Parameter xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" name=\"Title\"><string xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\">Run 1</string></Parameter></arguments></DirectiveMessage>",
    );
}

#[test]
fn directive_response() {
    let results = param("Results").ints([12, 47, 33]).build().unwrap();
    let msg = MessageBuilder::new()
        .kind(MessageKind::DirectiveResponse)
        .target(TARGET)
        .timestamp_str("1410819035.27")
        .transaction_id(1)
        .directive("StartProcessing")
        .parameters([results])
        .build()
        .unwrap();
    assert_ascii(
        &msg,
        "|GEMS|14|0000000112|1||1410819035.270000000|System/Device1|DIR-R|||StartProcessing|1|Results:int[3]=12,47,33|END",
    );
    assert_xml(
        &msg,
        "<DirectiveResponse xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" gems_version=\"1.4\" target=\"System/Device1\" transaction_id=\"1\" timestamp=\"1410819035.27\"><Result></Result><directive_name>StartProcessing</directive_name><return_values><Parameter xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" name=\"Results\" multiplicity=\"3\"><int xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\">12</int><int xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\">47</int><int xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\">33</int></Parameter></return_values></DirectiveResponse>",
    );
}

#[test]
fn disconnect_message() {
    let msg = MessageBuilder::new()
        .kind(MessageKind::Disconnect)
        .target(TARGET)
        .timestamp_str("1410819035.27")
        .transaction_id(1)
        .disconnect_reason(DisconnectReason::NormalTermination)
        .build()
        .unwrap();
    assert_ascii(
        &msg,
        "|GEMS|14|0000000086|1||1410819035.270000000|System/Device1|DISC|NORMAL_TERMINATION|END",
    );
    assert_xml(
        &msg,
        "<DisconnectMessage xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" gems_version=\"1.4\" target=\"System/Device1\" transaction_id=\"1\" timestamp=\"1410819035.27\"><reason>NORMAL_TERMINATION</reason></DisconnectMessage>",
    );
}

#[test]
fn get_config_list_message() {
    let msg = MessageBuilder::new()
        .kind(MessageKind::GetConfigList)
        .target(TARGET)
        .timestamp_str("1410819035.28")
        .transaction_id(1)
        .build()
        .unwrap();
    assert_ascii(
        &msg,
        "|GEMS|14|0000000067|1||1410819035.280000000|System/Device1|GETL|END",
    );
    assert_xml(
        &msg,
        "<GetConfigListMessage xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" gems_version=\"1.4\" target=\"System/Device1\" transaction_id=\"1\" timestamp=\"1410819035.28\"></GetConfigListMessage>",
    );
}

#[test]
fn get_config_list_response() {
    let msg = MessageBuilder::new()
        .kind(MessageKind::GetConfigListResponse)
        .target(TARGET)
        .timestamp_str("1410819035.28")
        .transaction_id(1)
        .result_code(ResultCode::Success)
        .configuration_list(["ConfigA", "ConfigB", "ConfigC"])
        .build()
        .unwrap();
    assert_ascii(
        &msg,
        "|GEMS|14|0000000104|1||1410819035.280000000|System/Device1|GETL-R|SUCCESS||3|ConfigA|ConfigB|ConfigC|END",
    );
    assert_xml(
        &msg,
        "<GetConfigListResponse xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" gems_version=\"1.4\" target=\"System/Device1\" transaction_id=\"1\" timestamp=\"1410819035.28\"><Result>SUCCESS</Result><ConfigurationName>ConfigA</ConfigurationName><ConfigurationName>ConfigB</ConfigurationName><ConfigurationName>ConfigC</ConfigurationName></GetConfigListResponse>",
    );
}

#[test]
fn get_config_all() {
    let msg = MessageBuilder::new()
        .kind(MessageKind::GetConfig)
        .target(TARGET)
        .timestamp_str("1410819035.28")
        .transaction_id(1)
        .build()
        .unwrap();
    assert_ascii(
        &msg,
        "|GEMS|14|0000000067|1||1410819035.280000000|System/Device1|GET||END",
    );
    assert_xml(
        &msg,
        "<GetConfigMessage xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" gems_version=\"1.4\" target=\"System/Device1\" transaction_id=\"1\" timestamp=\"1410819035.28\"></GetConfigMessage>",
    );
}

#[test]
fn get_config_with_names() {
    let msg = MessageBuilder::new()
        .kind(MessageKind::GetConfig)
        .target(TARGET)
        .timestamp_str("1410819035.28")
        .transaction_id(1)
        .desired_parameters(["PacketLength", "FillPacket", "ChannelConfigList"])
        .build()
        .unwrap();
    assert_ascii(
        &msg,
        "|GEMS|14|0000000110|1||1410819035.280000000|System/Device1|GET|3|PacketLength|FillPacket|ChannelConfigList|END",
    );
    assert_xml(
        &msg,
        "<GetConfigMessage xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" gems_version=\"1.4\" target=\"System/Device1\" transaction_id=\"1\" timestamp=\"1410819035.28\"><Parameter xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" name=\"PacketLength\"></Parameter><Parameter xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" name=\"FillPacket\"></Parameter><Parameter xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" name=\"ChannelConfigList\"></Parameter></GetConfigMessage>",
    );
}

#[test]
fn get_config_response_with_nested_sets() {
    let packet_length = param("PacketLength").ints([1024]).build().unwrap();
    let fill_packet = param("FillPacket").bools([true]).build().unwrap();
    let empty_strings = param("EmptyStringList")
        .empty(Datatype::String)
        .multiplicity(0)
        .build()
        .unwrap();
    let empty_ints = param("EmptyIntList")
        .empty(Datatype::Int)
        .multiplicity(0)
        .build()
        .unwrap();
    let group = |n: i32| {
        let name = param("ChannelName")
            .strings([format!("Channel{n}")])
            .build()
            .unwrap();
        let id = param("ChannelID").ints([n]).build().unwrap();
        let rate = param("BitRate").ints([200000 * (n + 1)]).build().unwrap();
        ParameterBuilder::new()
            .name("")
            .parameters([name, id, rate])
            .build()
            .unwrap()
    };
    let channel_list = param("ChannelConfigList")
        .parameters([group(0), group(1), group(2)])
        .build()
        .unwrap();

    let msg = MessageBuilder::new()
        .kind(MessageKind::GetConfigResponse)
        .target(TARGET)
        .timestamp_str("1410819035.28")
        .transaction_id(1)
        .parameters([packet_length, fill_packet, empty_strings, empty_ints, channel_list])
        .build()
        .unwrap();

    assert_ascii(
        &msg,
        "|GEMS|14|0000000385|1||1410819035.280000000|System/Device1|GET-R|||5|PacketLength:int=1024|FillPacket:bool=true|EmptyStringList:string[0]=|EmptyIntList:int[0]=|ChannelConfigList:set_type[3]=ChannelName:string=Channel0;ChannelID:int=0;BitRate:int=200000;,ChannelName:string=Channel1;ChannelID:int=1;BitRate:int=400000;,ChannelName:string=Channel2;ChannelID:int=2;BitRate:int=600000;|END",
    );
    assert_xml(
        &msg,
        "<GetConfigResponse xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" gems_version=\"1.4\" target=\"System/Device1\" transaction_id=\"1\" timestamp=\"1410819035.28\"><Result></Result><Parameter xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" name=\"PacketLength\"><int xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\">1024</int></Parameter><Parameter xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" name=\"FillPacket\"><boolean xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\">true</boolean></Parameter><Parameter xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" name=\"EmptyStringList\" multiplicity=\"0\"><string xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\"></string></Parameter><Parameter xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" name=\"EmptyIntList\" multiplicity=\"0\"><int xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\"></int></Parameter><ParameterSet xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" name=\"ChannelConfigList\" multiplicity=\"3\"><ParameterSet xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\"><Parameter xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" name=\"ChannelName\"><string xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\">Channel0</string></Parameter><Parameter xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" name=\"ChannelID\"><int xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\">0</int></Parameter><Parameter xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" name=\"BitRate\"><int xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\">200000</int></Parameter></ParameterSet><ParameterSet xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\"><Parameter xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" name=\"ChannelName\"><string xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\">Channel1</string></Parameter><Parameter xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" name=\"ChannelID\"><int xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\">1</int></Parameter><Parameter xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" name=\"BitRate\"><int xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\">400000</int></Parameter></ParameterSet><ParameterSet xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\"><Parameter xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" name=\"ChannelName\"><string xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\">Channel2</string></Parameter><Parameter xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" name=\"ChannelID\"><int xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\">2</int></Parameter><Parameter xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" name=\"BitRate\"><int xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\">600000</int></Parameter></ParameterSet></ParameterSet></GetConfigResponse>",
    );
}

#[test]
fn load_config_round_trip() {
    let msg = MessageBuilder::new()
        .kind(MessageKind::LoadConfig)
        .target(TARGET)
        .timestamp_str("1410819035.28")
        .transaction_id(1)
        .configuration_name("MySavedConfig")
        .build()
        .unwrap();
    assert_ascii(
        &msg,
        "|GEMS|14|0000000081|1||1410819035.280000000|System/Device1|LOAD|MySavedConfig|END",
    );
    assert_xml(
        &msg,
        "<LoadConfigMessage xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" gems_version=\"1.4\" target=\"System/Device1\" transaction_id=\"1\" timestamp=\"1410819035.28\"><name>MySavedConfig</name></LoadConfigMessage>",
    );

    let resp = MessageBuilder::new()
        .kind(MessageKind::LoadConfigResponse)
        .target(TARGET)
        .timestamp_str("1410819035.28")
        .transaction_id(1)
        .result_code(ResultCode::Success)
        .parameter_count(14)
        .build()
        .unwrap();
    assert_ascii(
        &resp,
        "|GEMS|14|0000000081|1||1410819035.280000000|System/Device1|LOAD-R|SUCCESS||14|END",
    );
    assert_xml(
        &resp,
        "<LoadConfigResponse xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" gems_version=\"1.4\" target=\"System/Device1\" transaction_id=\"1\" timestamp=\"1410819035.28\"><Result>SUCCESS</Result><parameters_loaded>14</parameters_loaded></LoadConfigResponse>",
    );
}

#[test]
fn ping_round_trip() {
    let msg = MessageBuilder::new()
        .kind(MessageKind::Ping)
        .target(TARGET)
        .timestamp_str("1410819035.28")
        .transaction_id(1)
        .build()
        .unwrap();
    assert_ascii(
        &msg,
        "|GEMS|14|0000000067|1||1410819035.280000000|System/Device1|PING|END",
    );
    assert_xml(
        &msg,
        "<PingMessage xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" gems_version=\"1.4\" target=\"System/Device1\" transaction_id=\"1\" timestamp=\"1410819035.28\"></PingMessage>",
    );

    let resp = MessageBuilder::new()
        .kind(MessageKind::PingResponse)
        .target(TARGET)
        .timestamp_str("1410819035.28")
        .transaction_id(1)
        .result_code(ResultCode::Success)
        .build()
        .unwrap();
    assert_ascii(
        &resp,
        "|GEMS|14|0000000078|1||1410819035.280000000|System/Device1|PING-R|SUCCESS||END",
    );
    assert_xml(
        &resp,
        "<PingResponse xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" gems_version=\"1.4\" target=\"System/Device1\" transaction_id=\"1\" timestamp=\"1410819035.28\"><Result>SUCCESS</Result></PingResponse>",
    );
}

#[test]
fn save_config_round_trip() {
    let msg = MessageBuilder::new()
        .kind(MessageKind::SaveConfig)
        .target(TARGET)
        .timestamp_str("1410819035.28")
        .transaction_id(1)
        .configuration_name("MySavedConfig")
        .build()
        .unwrap();
    assert_ascii(
        &msg,
        "|GEMS|14|0000000081|1||1410819035.280000000|System/Device1|SAVE|MySavedConfig|END",
    );
    assert_xml(
        &msg,
        "<SaveConfigMessage xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" gems_version=\"1.4\" target=\"System/Device1\" transaction_id=\"1\" timestamp=\"1410819035.28\"><name>MySavedConfig</name></SaveConfigMessage>",
    );

    let resp = MessageBuilder::new()
        .kind(MessageKind::SaveConfigResponse)
        .target(TARGET)
        .timestamp_str("1410819035.28")
        .transaction_id(1)
        .result_code(ResultCode::Success)
        .parameter_count(27)
        .build()
        .unwrap();
    assert_ascii(
        &resp,
        "|GEMS|14|0000000081|1||1410819035.280000000|System/Device1|SAVE-R|SUCCESS||27|END",
    );
    assert_xml(
        &resp,
        "<SaveConfigResponse xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" gems_version=\"1.4\" target=\"System/Device1\" transaction_id=\"1\" timestamp=\"1410819035.28\"><Result>SUCCESS</Result><parameters_saved>27</parameters_saved></SaveConfigResponse>",
    );
}

#[test]
fn set_config_escape_handling() {
    let params = [
        ("Ampersand", "Bob & Sally"),
        ("Pipe", "Bob | Sally"),
        ("Comma", "Bob, Sally"),
        ("Semicolon", "Bob; Sally"),
        ("LessThan", "Bob < Sally"),
    ]
    .map(|(name, value)| param(name).strings([value]).build().unwrap());
    let msg = MessageBuilder::new()
        .kind(MessageKind::SetConfig)
        .target(TARGET)
        .timestamp_str("1410819035.27")
        .transaction_id(1)
        .parameters(params)
        .build()
        .unwrap();
    assert_ascii(
        &msg,
        "|GEMS|14|0000000205|1||1410819035.270000000|System/Device1|SET|5|Ampersand:string=Bob &a Sally|Pipe:string=Bob &b Sally|Comma:string=Bob&c Sally|Semicolon:string=Bob&d Sally|LessThan:string=Bob < Sally|END",
    );
    assert_xml(
        &msg,
        "<SetConfigMessage xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" gems_version=\"1.4\" target=\"System/Device1\" transaction_id=\"1\" timestamp=\"1410819035.27\"><Parameter xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" name=\"Ampersand\"><string xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\">Bob &amp; Sally</string></Parameter><Parameter xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" name=\"Pipe\"><string xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\">Bob | Sally</string></Parameter><Parameter xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" name=\"Comma\"><string xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\">Bob, Sally</string></Parameter><Parameter xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" name=\"Semicolon\"><string xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\">Bob; Sally</string></Parameter><Parameter xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" name=\"LessThan\"><string xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\">Bob &lt; Sally</string></Parameter></SetConfigMessage>",
    );
}

#[test]
fn set_config_every_datatype() {
    let channel0 = |set_name: &str| {
        let name = param("ChannelName").strings(["Channel0"]).build().unwrap();
        let id = param("ChannelID").ints([0]).build().unwrap();
        let rates = param("BitRates").ints([200, 2000]).build().unwrap();
        param(set_name).parameters([name, id, rates]).build().unwrap()
    };

    let msg = MessageBuilder::new()
        .kind(MessageKind::SetConfig)
        .target(TARGET)
        .timestamp_str("1410819035.27")
        .transaction_id(1)
        .parameters([
            param("IntValue").ints([1024]).build().unwrap(),
            param("HexValue").hex_values(["FAF320/24"]).build().unwrap(),
            param("BoolValue").bools([true]).build().unwrap(),
            param("DoubleValue").doubles([1.234]).build().unwrap(),
            param("LongValue").longs([123456789]).build().unwrap(),
            param("TimeValue").times(["1410804178.49023000"]).build().unwrap(),
            param("UtimeValue").utimes(["2009-273T09:14:50.02Z"]).build().unwrap(),
            param("StringValue").strings(["My String"]).build().unwrap(),
            param("EmptyStringValue").empty(Datatype::String).build().unwrap(),
            param("IntList").ints([1024, 1, 2, 3]).build().unwrap(),
            param("HexList").hex_values(["FAF320/24", "EB90/16"]).build().unwrap(),
            param("BoolList").bools([true, false, true]).build().unwrap(),
            param("DoubleList").doubles([1.234, 11234567890.0]).build().unwrap(),
            param("LongList").longs([123456789, -1, 234569999]).build().unwrap(),
            param("TimeList")
                .times(["1410804178.49023000", "1410804179.48047000"])
                .build()
                .unwrap(),
            param("UtimeList")
                .utimes(["2009-273T09:14:50.02Z", "2014-100T09:14:50.02Z"])
                .build()
                .unwrap(),
            param("StringList").strings(["Item 1", "Item 2"]).build().unwrap(),
            param("EmptyStringList")
                .empty(Datatype::String)
                .multiplicity(0)
                .build()
                .unwrap(),
            channel0("SingleParameterSet"),
            param("ParameterSetList")
                .parameters([
                    channel_group(0, [200, 2000]),
                    channel_group(1, [400, 4000]),
                    channel_group(2, [600, 6000]),
                ])
                .build()
                .unwrap(),
        ])
        .build()
        .unwrap();

    assert_ascii(
        &msg,
        "|GEMS|14|0000001034|1||1410819035.270000000|System/Device1|SET|20|IntValue:int=1024|HexValue:hex_value=FAF320/24|BoolValue:bool=true|DoubleValue:double=1.234|LongValue:long=123456789|TimeValue:time=1410804178.490230000|UtimeValue:utime=2009-273T09:14:50.020000000Z|StringValue:string=My String|EmptyStringValue:string=|IntList:int[4]=1024,1,2,3|HexList:hex_value[2]=FAF320/24,EB90/16|BoolList:bool[3]=true,false,true|DoubleList:double[2]=1.234,11234567890|LongList:long[3]=123456789,-1,234569999|TimeList:time[2]=1410804178.490230000,1410804179.480470000|UtimeList:utime[2]=2009-273T09:14:50.020000000Z,2014-100T09:14:50.020000000Z|StringList:string[2]=Item 1,Item 2|EmptyStringList:string[0]=|SingleParameterSet:set_type=ChannelName:string=Channel0;ChannelID:int=0;BitRates:int[2]=200,2000;|ParameterSetList:set_type[3]=ChannelName:string=Channel0;ChannelID:int=0;BitRates:int[2]=200,2000;,ChannelName:string=Channel1;ChannelID:int=1;BitRates:int[2]=400,4000;,ChannelName:string=Channel2;ChannelID:int=2;BitRates:int[2]=600,6000;|END",
    );

    // XML side: spot-check the wire, then the round-trip law.
    let encoded = xml::encode_message(&msg).unwrap();
    assert!(encoded.contains(
        "<hex_value xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" bit_length=\"24\">FAF320</hex_value>"
    ));
    assert!(encoded.contains(
        "<utime xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\">2009-273T09:14:50.020000000Z</utime>"
    ));
    assert!(encoded.contains(
        "<ParameterSet xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" name=\"ParameterSetList\" multiplicity=\"3\"><ParameterSet xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\"><Parameter"
    ));
    let decoded = xml::decode_message(encoded.as_bytes()).unwrap();
    assert_eq!(decoded, msg);
}

#[test]
fn set_config_response() {
    let msg = MessageBuilder::new()
        .kind(MessageKind::SetConfigResponse)
        .target(TARGET)
        .timestamp_str("1410819035.28")
        .transaction_id(1)
        .parameter_count(5)
        .result_code(ResultCode::Success)
        .build()
        .unwrap();
    assert_ascii(
        &msg,
        "|GEMS|14|0000000079|1||1410819035.280000000|System/Device1|SET-R|SUCCESS||5|END",
    );
    assert_xml(
        &msg,
        "<SetConfigResponse xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" gems_version=\"1.4\" target=\"System/Device1\" transaction_id=\"1\" timestamp=\"1410819035.28\"><Result>SUCCESS</Result><parameters_set>5</parameters_set></SetConfigResponse>",
    );
}

#[test]
fn unknown_response() {
    let msg = MessageBuilder::new()
        .kind(MessageKind::UnknownResponse)
        .timestamp_str("1410819035.26")
        .transaction_id(0)
        .result_code(ResultCode::MalformedMessage)
        .response_description("Not a GEMS message")
        .build()
        .unwrap();
    assert_ascii(
        &msg,
        "|GEMS|14|0000000091|0||1410819035.260000000||UKN-R|MALFORMED_MESSAGE|Not a GEMS message|END",
    );
    assert_xml(
        &msg,
        "<UnknownResponse xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" gems_version=\"1.4\" transaction_id=\"0\" timestamp=\"1410819035.26\"><Result>MALFORMED_MESSAGE</Result><description>Not a GEMS message</description></UnknownResponse>",
    );
}

#[test]
fn async_status_round_trip() {
    let level = param("SignalLevel").doubles([-3.5]).build().unwrap();
    let msg = MessageBuilder::new()
        .kind(MessageKind::AsyncStatus)
        .target(TARGET)
        .timestamp_str("1410819035.29")
        .result_code(ResultCode::Success)
        .parameters([level])
        .build()
        .unwrap();
    // AsyncStatus is unsolicited, so it typically carries no transaction id.
    assert_ascii(
        &msg,
        "|GEMS|14|0000000102|||1410819035.290000000|System/Device1|ASYNC|SUCCESS||1|SignalLevel:double=-3.5|END",
    );
    assert_xml(
        &msg,
        "<AsyncStatusMessage xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" gems_version=\"1.4\" target=\"System/Device1\" timestamp=\"1410819035.29\"><Result>SUCCESS</Result><Parameter xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" name=\"SignalLevel\"><double xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\">-3.5</double></Parameter></AsyncStatusMessage>",
    );
}

#[test]
fn standalone_parameter_xml_golden() {
    let cases: Vec<(ParameterNode, &str)> = vec![
        (
            ParameterBuilder::new().build().unwrap(),
            "<Parameter xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\"></Parameter>",
        ),
        (
            param("EmptyVersion1").parameters([]).build().unwrap(),
            "<ParameterSet xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" name=\"EmptyVersion1\"><Parameter xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\"></Parameter></ParameterSet>",
        ),
        (
            param("StringValue").strings(["My String"]).build().unwrap(),
            "<Parameter xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" name=\"StringValue\"><string xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\">My String</string></Parameter>",
        ),
        (
            param("HexValue").hex_values(["FAF320/24"]).build().unwrap(),
            "<Parameter xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" name=\"HexValue\"><hex_value xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" bit_length=\"24\">FAF320</hex_value></Parameter>",
        ),
        (
            param("ByteValue").bytes([127]).build().unwrap(),
            "<Parameter xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" name=\"ByteValue\"><byte xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\">127</byte></Parameter>",
        ),
        (
            param("UbyteValue").ubytes([255]).build().unwrap(),
            "<Parameter xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" name=\"UbyteValue\"><ubyte xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\">255</ubyte></Parameter>",
        ),
        (
            param("ShortValue").shorts([12]).build().unwrap(),
            "<Parameter xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" name=\"ShortValue\"><short xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\">12</short></Parameter>",
        ),
        (
            param("UshortValue").ushorts([12]).build().unwrap(),
            "<Parameter xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" name=\"UshortValue\"><ushort xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\">12</ushort></Parameter>",
        ),
        (
            param("UintValue").uints([123]).build().unwrap(),
            "<Parameter xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" name=\"UintValue\"><uint xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\">123</uint></Parameter>",
        ),
        (
            param("UlongValue").ulongs([123456789]).build().unwrap(),
            "<Parameter xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" name=\"UlongValue\"><ulong xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\">123456789</ulong></Parameter>",
        ),
        (
            param("BoolList").bools([true, false, true]).build().unwrap(),
            "<Parameter xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" name=\"BoolList\" multiplicity=\"3\"><boolean xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\">true</boolean><boolean xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\">false</boolean><boolean xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\">true</boolean></Parameter>",
        ),
        (
            param("Escape<>Me").strings(["Escape&This"]).build().unwrap(),
            "<Parameter xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" name=\"Escape&lt;&gt;Me\"><string xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\">Escape&amp;This</string></Parameter>",
        ),
    ];

    for (node, expect) in &cases {
        let encoded = xml::encode_parameter(node).unwrap();
        assert_eq!(&encoded, expect);
        let decoded = xml::decode_parameter(encoded.as_bytes()).unwrap();
        assert_eq!(&decoded, node);
    }
}

#[test]
fn cross_psm_equivalence() {
    // The same message decoded from either PSM compares equal.
    let from_ascii = ascii::decode_message(
        b"|GEMS|14|0000000067|1||1410819035.280000000|System/Device1|PING|END",
    )
    .unwrap();
    let from_xml = xml::decode_message(
        b"<PingMessage xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" gems_version=\"1.4\" target=\"System/Device1\" transaction_id=\"1\" timestamp=\"1410819035.28\"></PingMessage>",
    )
    .unwrap();
    assert_eq!(from_ascii, from_xml);
}

#[test]
fn xml_rejects_wrong_version_and_unknown_root() {
    let err = xml::decode_message(
        b"<PingMessage xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" gems_version=\"2.0\"></PingMessage>",
    )
    .unwrap_err();
    assert!(err.to_string().contains("incorrect gems version"));

    let err = xml::decode_message(b"<NotAMessage gems_version=\"1.4\"></NotAMessage>").unwrap_err();
    assert!(err.to_string().contains("unknown message element"));
}

#[test]
fn xml_decodes_self_closed_and_prefixed_forms() {
    // Other stacks may self-close empty messages or prefix the namespace.
    let msg = xml::decode_message(
        b"<PingMessage xmlns=\"http://www.omg.org/spec/gems/20110323/basetypes\" gems_version=\"1.4\" transaction_id=\"7\"/>",
    )
    .unwrap();
    assert_eq!(msg.kind(), MessageKind::Ping);
    assert_eq!(msg.transaction_id(), Some(7));

    let msg = xml::decode_message(
        b"<g:PingResponse xmlns:g=\"http://www.omg.org/spec/gems/20110323/basetypes\" gems_version=\"1.4\"><g:Result>SUCCESS</g:Result></g:PingResponse>",
    )
    .unwrap();
    assert_eq!(msg.result().unwrap().code, ResultCode::Success);
}
